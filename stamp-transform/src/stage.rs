//! The header stage — renders a header per file and prepends it.
//!
//! Three ways to drive it:
//!
//! - [`HeaderTransform::transform`] — one file, synchronously.
//! - [`HeaderTransform::apply`] — lazy adapter over a `Stream` of files.
//! - [`HeaderTransform::spawn`] — push protocol over bounded channels:
//!   [`StageWriter::write`] / [`StageWriter::end`] in, [`StageOutput`] out.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;

use stamp_core::File;
use stamp_renderer::{HeaderTemplate, RenderError, TemplateContext, TemplateSyntaxError};

use crate::error::{render_err, TransformError};
use crate::prepend::prepend;

// ---------------------------------------------------------------------------
// HeaderTransform
// ---------------------------------------------------------------------------

/// Prepends a rendered header to every file passed through it.
///
/// The template is compiled once at construction and owned by the stage.
/// A template that fails to compile does not fail construction: every file
/// with contents then yields [`TransformError::Render`]. Use
/// [`HeaderTransform::try_new`] to fail fast instead.
#[derive(Debug, Clone)]
pub struct HeaderTransform {
    template: Result<HeaderTemplate, TemplateSyntaxError>,
    context: TemplateContext,
}

impl Default for HeaderTransform {
    /// Identity stage: contents pass through byte for byte.
    fn default() -> Self {
        HeaderTransform {
            template: Ok(HeaderTemplate::literal("")),
            context: TemplateContext::new(),
        }
    }
}

impl HeaderTransform {
    pub fn new(template: &str, context: TemplateContext) -> Self {
        HeaderTransform {
            template: HeaderTemplate::compile(template),
            context,
        }
    }

    pub fn try_new(template: &str, context: TemplateContext) -> Result<Self, TemplateSyntaxError> {
        Ok(HeaderTransform {
            template: Ok(HeaderTemplate::compile(template)?),
            context,
        })
    }

    /// A stage prepending `text` verbatim, without placeholder substitution.
    pub fn raw(text: &str) -> Self {
        HeaderTransform {
            template: Ok(HeaderTemplate::literal(text)),
            context: TemplateContext::new(),
        }
    }

    /// True when no file's contents can change.
    pub fn is_identity(&self) -> bool {
        matches!(&self.template, Ok(template) if template.is_empty())
    }

    /// Render the header `file` would receive.
    pub fn render_header(&self, file: &File) -> Result<String, RenderError> {
        let template = self.template.as_ref().map_err(|e| RenderError::Syntax(e.clone()))?;
        if let Some(text) = template.static_text() {
            return Ok(text.to_string());
        }
        let ctx = TemplateContext::for_file(file, &self.context)?;
        template.render(&ctx)
    }

    /// Prepend the header to one file.
    ///
    /// Files without contents are returned untouched. Streamed contents are
    /// spliced and returned before the original stream has been read.
    pub fn transform(&self, mut file: File) -> Result<File, TransformError> {
        if file.contents().is_null() {
            tracing::debug!(path = %file.path().display(), "no contents, passing through");
            return Ok(file);
        }

        let header = match self.render_header(&file) {
            Ok(header) => header,
            Err(err) => {
                tracing::warn!(path = %file.path().display(), error = %err, "header rendering failed");
                return Err(render_err(file.path(), err));
            }
        };
        if header.is_empty() {
            return Ok(file);
        }

        let contents = file.replace_contents(Default::default());
        tracing::debug!(
            path = %file.path().display(),
            header_bytes = header.len(),
            streamed = contents.is_stream(),
            "prepending header",
        );
        file.replace_contents(prepend(&header, contents));
        Ok(file)
    }

    /// Transform every file of `input`, in order.
    ///
    /// Upstream is polled only when the returned stream is, so a slow
    /// consumer slows the producer down.
    pub fn apply<'a, S>(&'a self, input: S) -> impl Stream<Item = Result<File, TransformError>> + 'a
    where
        S: Stream<Item = File> + 'a,
    {
        input.map(move |file| self.transform(file))
    }

    /// Run the stage on its own task and talk to it over bounded channels.
    ///
    /// `capacity` bounds both the input and the output queue (minimum 1).
    /// [`StageWriter::write`] waits while the stage is full, so a single task
    /// writing more than that many files must also drain [`StageOutput`]
    /// concurrently. Must be called within a tokio runtime.
    pub fn spawn(self, capacity: usize) -> (StageWriter, StageOutput) {
        let capacity = capacity.max(1);
        let (input_tx, mut input_rx) = mpsc::channel::<File>(capacity);
        let (output_tx, output_rx) = mpsc::channel(capacity);

        tokio::spawn(async move {
            let mut seen = 0usize;
            while let Some(file) = input_rx.recv().await {
                seen += 1;
                if output_tx.send(self.transform(file)).await.is_err() {
                    tracing::debug!("stage output dropped, stopping");
                    return;
                }
            }
            tracing::debug!(files = seen, "stage input ended");
        });

        (StageWriter { tx: input_tx }, StageOutput { rx: output_rx })
    }
}

// ---------------------------------------------------------------------------
// Push handle
// ---------------------------------------------------------------------------

/// Input side of a spawned stage.
#[derive(Debug, Clone)]
pub struct StageWriter {
    tx: mpsc::Sender<File>,
}

impl StageWriter {
    /// Queue a file, waiting while the stage is at capacity.
    pub async fn write(&self, file: File) -> Result<(), TransformError> {
        self.tx
            .send(file)
            .await
            .map_err(|_| TransformError::ChannelClosed("stage input"))
    }

    /// Signal end of input. The output ends once queued files are emitted.
    ///
    /// Dropping every clone of the writer has the same effect.
    pub fn end(self) {}
}

/// Output side of a spawned stage: one item per written file, in write
/// order, then `None` once the writer has ended.
#[derive(Debug)]
pub struct StageOutput {
    rx: mpsc::Receiver<Result<File, TransformError>>,
}

impl StageOutput {
    pub async fn next(&mut self) -> Option<Result<File, TransformError>> {
        self.rx.recv().await
    }
}

impl Stream for StageOutput {
    type Item = Result<File, TransformError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
