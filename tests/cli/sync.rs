use anyhow::Result;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use crate::{CliTest, stderr, stdout};

fn read_json(test: &CliTest, path: &str) -> Result<Value> {
    Ok(serde_json::from_str(&test.read_file(path)?)?)
}

#[test]
fn test_sync_prunes_unused_keys_without_translating() -> Result<()> {
    let test = CliTest::with_locales(
        r#"{"default": {"hello": "你好", "bye": "再见"}}"#,
        r#"{"default": {"hello": "Hello", "bye": "Bye"}}"#,
    )?;
    test.write_file("src/app.ts", "export const title = i18n.s('你好');\n")?;

    let output = test.sync_command().output()?;
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("pruned 1 unused key"));

    assert_eq!(
        read_json(&test, "locales/zh.json")?,
        json!({"default": {"hello": "你好"}})
    );
    assert_eq!(
        read_json(&test, "locales/en.json")?,
        json!({"default": {"hello": "Hello"}})
    );

    Ok(())
}

#[test]
fn test_sync_keeps_keys_when_a_source_file_fails_to_parse() -> Result<()> {
    let test = CliTest::with_locales(
        r#"{"default": {"hello": "你好", "bye": "再见"}}"#,
        r#"{"default": {"hello": "Hello", "bye": "Bye"}}"#,
    )?;
    test.write_file("src/app.ts", "export const title = i18n.s('你好');\n")?;
    test.write_file("src/broken.ts", "export const = ;\n")?;

    let output = test.sync_command().output()?;
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("unused keys were kept"));
    assert_eq!(
        read_json(&test, "locales/zh.json")?,
        json!({"default": {"hello": "你好", "bye": "再见"}})
    );

    Ok(())
}
