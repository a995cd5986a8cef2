use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

fn jmd(cwd: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("jmd"));
    cmd.current_dir(cwd.path()).env_remove("JMD_CONFIG").env_remove("RUST_LOG");
    cmd
}

fn project(temp: &TempDir, module_info: &str, declared: &str) {
    temp.child("app/src/main/java/module-info.java")
        .write_str(module_info)
        .unwrap();
    temp.child("app/project.json")
        .write_str(&format!(
            r#"{{
  "project": "app",
  "group": "org.example",
  "source_sets": [
    {{ "name": "main", "source_roots": ["src/main/java"] }},
    {{ "name": "test", "source_roots": ["src/test/java"] }}
  ],
  "declared": {declared}
}}"#
        ))
        .unwrap();
}

#[test]
fn help_mentions_core_commands() {
    let temp = TempDir::new().unwrap();
    jmd(&temp).arg("--help").assert().success().stdout(
        predicate::str::contains("check")
            .and(predicate::str::contains("mappings"))
            .and(predicate::str::contains("catalog"))
            .and(predicate::str::contains("order"))
            .and(predicate::str::contains("generate"))
            .and(predicate::str::contains("analyze")),
    );
}

#[test]
fn check_json_registers_derived_dependencies() {
    let temp = TempDir::new().unwrap();
    project(
        &temp,
        "module org.example.app {\n    requires transitive org.slf4j;\n    requires com.google.gson;\n}\n",
        "{}",
    );

    let output = jmd(&temp)
        .arg("check")
        .arg("app/project.json")
        .arg("--json")
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let registered = v["registered"]["app"].as_array().unwrap();
    assert_eq!(registered.len(), 2);
    assert_eq!(registered[0]["bucket"], "api");
    assert_eq!(registered[0]["coordinate"], "org.slf4j:slf4j-api");
    assert_eq!(registered[1]["bucket"], "implementation");
    assert_eq!(registered[1]["coordinate"], "com.google.code.gson:gson");

    let reports = v["reports"].as_array().unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[1]["unit"], "app:test");
    assert_eq!(reports[1]["skipped"], true);
}

#[test]
fn check_fails_on_missing_mapping() {
    let temp = TempDir::new().unwrap();
    project(
        &temp,
        "module org.example.app {\n    requires org.unknown.thing;\n}\n",
        "{}",
    );

    jmd(&temp)
        .arg("check")
        .arg("app/project.json")
        .assert()
        .code(1)
        .stdout(
            predicate::str::contains("[fatal] MissingMapping org.unknown.thing")
                .and(predicate::str::contains("summary: 2 unit(s), 1 fatal, 0 advisory")),
        );
}

#[test]
fn user_mapping_from_config_fixes_missing_mapping() {
    let temp = TempDir::new().unwrap();
    project(
        &temp,
        "module org.example.app {\n    requires org.unknown.thing;\n}\n",
        "{}",
    );
    temp.child("jmd.toml")
        .write_str("[mappings]\n\"org.unknown.thing\" = \"org.unknown:thing\"\n")
        .unwrap();

    jmd(&temp)
        .arg("check")
        .arg("app/project.json")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 declaration(s), 0 fatal, 0 advisory"));
}

#[test]
fn invalid_config_is_a_usage_error() {
    let temp = TempDir::new().unwrap();
    project(&temp, "module org.example.app {\n}\n", "{}");
    temp.child("custom.toml")
        .write_str("[prefix_groups]\n\"org.example\" = \"org.example\"\n")
        .unwrap();

    jmd(&temp)
        .arg("--config")
        .arg("custom.toml")
        .arg("check")
        .arg("app/project.json")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid configuration"));
}

#[test]
fn strict_unused_fails_the_check() {
    let temp = TempDir::new().unwrap();
    project(
        &temp,
        "module org.example.app {\n}\n",
        r#"{ "implementation": ["org.apache.xmlbeans:xmlbeans:5.2.0"] }"#,
    );
    temp.child("jmd.toml")
        .write_str("[checks]\nstrict_unused = true\n")
        .unwrap();

    jmd(&temp)
        .arg("check")
        .arg("app/project.json")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("UnusedDeclared"));
}

#[test]
fn order_reports_unsorted_requires() {
    let temp = TempDir::new().unwrap();
    temp.child("lib/src/main/java/module-info.java")
        .write_str(
            "module org.example.lib {\n    requires org.slf4j;\n    requires com.google.gson;\n}\n",
        )
        .unwrap();
    temp.child("lib/build/module-info.java")
        .write_str("module ignored {\n    requires b;\n    requires a;\n}\n")
        .unwrap();

    jmd(&temp)
        .arg("order")
        .arg(".")
        .assert()
        .code(1)
        .stdout(
            predicate::str::contains("Please use this order")
                .and(predicate::str::contains(
                    "    requires com.google.gson;\n    requires org.slf4j;",
                ))
                .and(predicate::str::contains("ignored").not()),
        );
}

#[test]
fn catalog_build_reduces_upstream_listing() {
    let temp = TempDir::new().unwrap();
    temp.child("upstream.properties")
        .write_str(concat!(
            "org.slf4j=https://repo.maven.apache.org/maven2/org/slf4j/slf4j-api/2.0.9/slf4j-api-2.0.9.jar\n",
            "slf4j.api=https://repo.maven.apache.org/maven2/org/slf4j/slf4j-api/1.7.36/slf4j-api-1.7.36.jar\n",
        ))
        .unwrap();

    jmd(&temp)
        .args(["catalog", "build", "upstream.properties", "-o", "modules.properties"])
        .assert()
        .success();
    temp.child("modules.properties")
        .assert("org.slf4j=org.slf4j:slf4j-api\n");

    jmd(&temp)
        .args(["catalog", "verify", "modules.properties"])
        .assert()
        .success()
        .stdout(predicate::str::contains("catalog: 1 entries, 0 conflict(s)"));
}

#[test]
fn generate_catalog_lists_declared_libraries() {
    let temp = TempDir::new().unwrap();
    project(
        &temp,
        "module org.example.app {\n    requires com.google.gson;\n}\n",
        r#"{ "implementation": ["com.google.code.gson:gson:2.10.1"] }"#,
    );

    jmd(&temp)
        .args(["generate", "catalog", "app/project.json"])
        .assert()
        .success()
        .stdout(
            predicate::str::starts_with("[libraries]\n")
                .and(predicate::str::contains(
                    "com-google-gson = { module = \"com.google.code.gson:gson\"",
                )),
        );
}

#[test]
fn generate_module_info_maps_declared_dependencies() {
    let temp = TempDir::new().unwrap();
    project(
        &temp,
        "module org.example.app {\n}\n",
        r#"{ "api": ["org.slf4j:slf4j-api"], "implementation": ["com.google.code.gson:gson"] }"#,
    );

    jmd(&temp)
        .args(["generate", "module-info", "app/project.json"])
        .assert()
        .success()
        .stdout(
            predicate::str::starts_with("module org.example.app {")
                .and(predicate::str::contains("requires transitive org.slf4j;"))
                .and(predicate::str::contains("requires com.google.gson;")),
        );
}

#[test]
fn failing_unit_does_not_hide_its_sibling() {
    let temp = TempDir::new().unwrap();
    project(
        &temp,
        "module org.example.app {\n    requires com.google.gson;\n}\n",
        "{}",
    );
    temp.child("app/src/test/java/module-info.java")
        .write_str("class NotAModule {}\n")
        .unwrap();

    jmd(&temp)
        .arg("check")
        .arg("app/project.json")
        .assert()
        .code(1)
        .stdout(
            predicate::str::contains("app:main (module org.example.app): 1 declaration(s)")
                .and(predicate::str::contains("app:test: failed, failed to parse"))
                .and(predicate::str::contains("summary: 2 unit(s), 1 fatal, 0 advisory")),
        );

    let output = jmd(&temp)
        .arg("check")
        .arg("app/project.json")
        .arg("--json")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let registered = v["registered"]["app"].as_array().unwrap();
    assert_eq!(registered.len(), 1);
    assert_eq!(registered[0]["coordinate"], "com.google.code.gson:gson");
    let reports = v["reports"].as_array().unwrap();
    assert_eq!(reports[0]["unit"], "app:main");
    assert!(reports[0].get("error").is_none());
    assert_eq!(reports[1]["unit"], "app:test");
    assert!(reports[1]["error"]
        .as_str()
        .unwrap()
        .contains("failed to parse"));
}

fn project_with_tests(temp: &TempDir) {
    project(
        temp,
        "module org.example.app {\n    requires transitive org.slf4j;\n    requires com.google.gson;\n}\n",
        "{}",
    );
    temp.child("app/src/test/java/module-info.java")
        .write_str("module org.example.app.test {\n    requires org.example.app;\n}\n")
        .unwrap();
}

#[test]
fn generate_build_deps_prints_dependencies_block() {
    let temp = TempDir::new().unwrap();
    project_with_tests(&temp);

    jmd(&temp)
        .args(["generate", "build-deps", "app/project.json"])
        .assert()
        .success()
        .stdout(
            "dependencies {\n\
             \x20   api(\"org.slf4j:slf4j-api\")\n\
             \x20   implementation(\"com.google.code.gson:gson\")\n\
             \n\
             \x20   testImplementation(project(\":app\"))\n\
             }\n",
        );
}

#[test]
fn generate_build_deps_rewrites_build_file_with_catalog_accessors() {
    let temp = TempDir::new().unwrap();
    project_with_tests(&temp);
    temp.child("app/build.gradle.kts")
        .write_str(
            "plugins {\n    id(\"java-library\")\n}\n\ndependencies {\n    implementation(\"old:old\")\n}\n",
        )
        .unwrap();

    jmd(&temp)
        .args(["generate", "build-deps", "app/project.json", "--catalog"])
        .args(["--build-file", "app/build.gradle.kts"])
        .assert()
        .success()
        .stdout("");

    let rewritten = std::fs::read_to_string(temp.path().join("app/build.gradle.kts")).unwrap();
    assert_eq!(
        rewritten,
        "plugins {\n    id(\"java-library\")\n}\n\n\
         dependencies {\n\
         \x20   api(libs.org.slf4j)\n\
         \x20   implementation(libs.com.google.gson)\n\
         \n\
         \x20   testImplementation(projects.app)\n\
         }\n"
    );
}

#[test]
fn generate_services_writes_meta_inf_files() {
    let temp = TempDir::new().unwrap();
    project(
        &temp,
        "module org.example.app {\n    provides org.example.spi.Plugin\n        with org.example.app.AppPlugin, org.example.app.OtherPlugin;\n}\n",
        "{}",
    );

    jmd(&temp)
        .args(["generate", "services", "app/project.json", "--output", "out"])
        .assert()
        .success()
        .stderr(predicate::str::contains("services: 1 file(s) written"));

    let content =
        std::fs::read_to_string(temp.path().join("out/META-INF/services/org.example.spi.Plugin"))
            .unwrap();
    assert_eq!(content, "org.example.app.AppPlugin\norg.example.app.OtherPlugin");

    jmd(&temp)
        .args(["generate", "services", "app/project.json", "--source-set", "test"])
        .args(["--output", "out"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("has no module declaration"));
}
