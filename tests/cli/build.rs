use anyhow::Result;
use pretty_assertions::assert_eq;

use crate::{CliTest, stderr, stdout};

const ZH: &str = r#"{
  "default": { "hello": "你好" },
  "dl": { "data source name": "数据源名称" }
}"#;

const EN: &str = r#"{
  "default": { "hello": "Hello" },
  "dl": { "data source name": "Data source name" }
}"#;

#[test]
fn test_production_build_rewrites_into_out_dir() -> Result<()> {
    let test = CliTest::with_locales(ZH, EN)?;
    test.write_file(
        "src/pages/home.tsx",
        "export const Home = () => <h1>{i18n.s('你好')}</h1>;\nconst label = i18n.s(\"数据源名称\", 'dl');\n",
    )?;
    test.write_file("src/util.ts", "export const n = 1;\n")?;

    let output = test
        .build_command()
        .args(["--production", "--out-dir", "dist"])
        .output()?;
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output).trim_end(),
        "✓ Rewrote 2 markers in 1 file (2 source files checked)"
    );

    assert_eq!(
        test.read_file("dist/src/pages/home.tsx")?,
        "export const Home = () => <h1>{i18n.t('hello')}</h1>;\nconst label = i18n.t(\"dl:data source name\");\n"
    );
    assert_eq!(test.read_file("dist/src/util.ts")?, "export const n = 1;\n");
    // Sources stay untouched
    assert!(test.read_file("src/pages/home.tsx")?.contains("i18n.s('你好')"));

    Ok(())
}

#[test]
fn test_production_build_without_out_dir_is_dry_run() -> Result<()> {
    let test = CliTest::with_locales(ZH, EN)?;
    test.write_file("src/app.ts", "i18n.s('你好');\n")?;

    let output = test.build_command().arg("--production").output()?;
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Would rewrite 1 marker in 1 file"));
    assert!(!test.root().join("dist").exists());

    Ok(())
}

#[test]
fn test_production_env_var_enables_production_mode() -> Result<()> {
    let test = CliTest::with_locales(ZH, EN)?;
    test.write_file("src/app.ts", "i18n.s('再见');\n")?;

    let output = test
        .build_command()
        .env("TRANSMARK_PRODUCTION", "true")
        .output()?;
    assert_eq!(output.status.code(), Some(2));

    Ok(())
}

#[test]
fn test_production_build_reports_every_missing_translation() -> Result<()> {
    let test = CliTest::with_locales(ZH, EN)?;
    test.write_file("src/a.ts", "const a = i18n.s('再见');\n")?;
    test.write_file("src/b.ts", "const b = i18n.s('谢谢', 'dl');\n")?;

    let output = test
        .build_command()
        .args(["--production", "--out-dir", "dist"])
        .output()?;
    assert_eq!(output.status.code(), Some(2));

    let out = stdout(&output);
    assert!(out.contains("\"再见\""), "stdout: {}", out);
    assert!(out.contains("src/a.ts:1:11"), "stdout: {}", out);
    assert!(out.contains("\"谢谢\""), "stdout: {}", out);
    assert!(out.contains("namespace \"dl\""), "stdout: {}", out);
    assert!(stderr(&output).contains("2 phrases without a translation"));
    // Nothing is written when the build fails
    assert!(!test.root().join("dist").exists());

    Ok(())
}

#[test]
fn test_unknown_namespace_is_a_configuration_error() -> Result<()> {
    let test = CliTest::with_locales(ZH, EN)?;
    test.write_file("src/a.ts", "i18n.s('你好', 'billing');\n")?;

    let output = test.build_command().arg("--production").output()?;
    assert_eq!(output.status.code(), Some(2));
    let err = stderr(&output);
    assert!(err.starts_with("Error: configuration error"), "stderr: {}", err);
    assert!(err.contains("billing"), "stderr: {}", err);

    Ok(())
}

#[test]
fn test_missing_config_is_a_configuration_error() -> Result<()> {
    let test = CliTest::new()?;
    test.write_file("src/a.ts", "i18n.s('你好');\n")?;

    let output = test.build_command().arg("--production").output()?;
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("'localePath' is required"));

    Ok(())
}

#[test]
fn test_corrupt_locale_file_aborts() -> Result<()> {
    let test = CliTest::with_locales("{ not json", EN)?;
    test.write_file("src/a.ts", "i18n.s('你好');\n")?;

    let output = test.build_command().arg("--production").output()?;
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("corrupt resource file"));

    Ok(())
}

#[test]
fn test_locale_path_override() -> Result<()> {
    let test = CliTest::with_locales("{}", "{}")?;
    test.write_file("i18n/zh.json", ZH)?;
    test.write_file("src/a.ts", "i18n.s('你好');\n")?;

    let output = test
        .build_command()
        .args(["--production", "--locale-path", "i18n", "--out-dir", "dist"])
        .output()?;
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(test.read_file("dist/src/a.ts")?, "i18n.t('hello');\n");

    Ok(())
}
