use rstest::rstest;
use serde_json::json;
use stamp_core::File;
use stamp_renderer::{HeaderTemplate, RenderError, TemplateContext};

fn fixture_file() -> File {
    File::new("./test/fixture/file.txt")
        .with_cwd("./test/")
        .with_base("./test/fixture/")
        .with_contents("Hello world")
}

fn render_for(template: &str, statics: serde_json::Value, file: &File) -> String {
    let statics = TemplateContext::from_serialize(&statics).expect("static context");
    let ctx = TemplateContext::for_file(file, &statics).expect("file context");
    HeaderTemplate::compile(template)
        .expect("compile")
        .render(&ctx)
        .expect("render")
}

#[rstest]
#[case::verbose("And then <%= foo %> said : ")]
#[case::compact("And then ${foo} said : ")]
#[case::compact_padded("And then ${ foo } said : ")]
#[case::verbose_tight("And then <%=foo%> said : ")]
fn both_syntaxes_substitute(#[case] template: &str) {
    let out = render_for(template, json!({ "foo": "you" }), &fixture_file());
    assert_eq!(out, "And then you said : ");
}

#[rstest]
#[case::relative("<%= file.relative %>", "file.txt")]
#[case::path("${file.path}", "test/fixture/file.txt")]
#[case::base("${file.base}", "test/fixture")]
#[case::cwd("${file.cwd}", "test")]
#[case::stem("${file.stem}${file.extname}", "file.txt")]
#[case::filename("${filename}", "file.txt")]
fn file_fields(#[case] template: &str, #[case] expected: &str) {
    assert_eq!(render_for(template, json!({}), &fixture_file()), expected);
}

#[test]
fn file_self_reference_lines() {
    let out = render_for(
        "<%= file.relative %>\n<%= file.path %>\n",
        json!({}),
        &fixture_file(),
    );
    assert_eq!(out, "file.txt\ntest/fixture/file.txt\n");
}

#[test]
fn data_entries_are_top_level() {
    let mut file = fixture_file();
    file.insert_data("license", "WTFPL");
    assert_eq!(render_for("<%= license %>\n", json!({}), &file), "WTFPL\n");
}

#[test]
fn mixed_syntaxes_in_one_template() {
    let out = render_for(
        "/*! <%= pkg.name %> v${pkg.version} | ${ pkg.license | upper } */\n",
        json!({ "pkg": { "name": "demo", "version": "1.2.0", "license": "mit" } }),
        &fixture_file(),
    );
    assert_eq!(out, "/*! demo v1.2.0 | MIT */\n");
}

#[test]
fn unknown_identifiers_render_empty() {
    let out = render_for("[<%= typo %>][${file.nope}]", json!({}), &fixture_file());
    assert_eq!(out, "[][]");
}

#[test]
fn syntax_error_is_reported_from_compile() {
    let err = HeaderTemplate::compile("And then <%= foo said").unwrap_err();
    assert_eq!(err.line, 1);
    assert_eq!(err.column, 10);
    let as_render: RenderError = err.into();
    assert!(as_render.to_string().starts_with("template syntax error"));
}

#[test]
fn empty_template_renders_nothing() {
    assert_eq!(render_for("", json!({ "foo": "you" }), &fixture_file()), "");
}
