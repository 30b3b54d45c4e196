//! End-to-end tests for the `slnmerge merge` and `slnmerge diff` commands.
//!
//! These tests invoke the binary directly against solutions in a temporary
//! directory and check the files it leaves behind.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_fs::prelude::*;
use predicates::prelude::*;

const UNITY_SLN: &str = r#"Microsoft Visual Studio Solution File, Format Version 12.00
# Visual Studio 16
Project("{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}") = "Assembly-CSharp", "Assembly-CSharp.csproj", "{1E7138DC-D3E2-51A8-4059-67524470B2E7}"
EndProject
Global
EndGlobal
"#;

const SERVER_SLN: &str = r#"Microsoft Visual Studio Solution File, Format Version 12.00
Project("{9A19103F-16F7-4668-BE54-9A1E7A4F7556}") = "Nantoka.Server", "Nantoka.Server.csproj", "{053476FC-B8B2-4A14-AED2-3733DFD5DFC3}"
EndProject
Global
EndGlobal
"#;

#[test]
fn test_merge_help() {
    let mut cmd = cargo_bin_cmd!("slnmerge");
    cmd.arg("merge")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Merge the overlay solution into a solution file",
        ));
}

#[test]
fn test_merge_with_default_overlay() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("Unity/App.sln").write_str(UNITY_SLN).unwrap();
    temp.child("Unity/App.Merge.sln").write_str(SERVER_SLN).unwrap();

    let mut cmd = cargo_bin_cmd!("slnmerge");
    cmd.arg("merge")
        .arg(temp.child("Unity/App.sln").path())
        .assert()
        .success();

    temp.child("Unity/App.sln")
        .assert(predicate::str::contains("Assembly-CSharp"))
        .assert(predicate::str::contains(
            r#""Nantoka.Server", "Nantoka.Server.csproj", "{053476FC-B8B2-4A14-AED2-3733DFD5DFC3}""#,
        ));
}

#[test]
fn test_merge_target_from_settings() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("Unity/App.sln").write_str(UNITY_SLN).unwrap();
    temp.child("Server/Server.sln").write_str(SERVER_SLN).unwrap();
    temp.child("Unity/App.sln.mergesettings")
        .write_str(
            r#"<SlnMergeSettings>
  <MergeTargetSolution>../Server/Server.sln</MergeTargetSolution>
  <SolutionFolders>
    <SolutionFolder FolderPath="Server" Guid="{F95BC0CF-E609-419F-B0A0-019BD5783670}" />
  </SolutionFolders>
  <NestedProjects>
    <NestedProject ProjectName="Nantoka.*" FolderPath="Server" />
  </NestedProjects>
</SlnMergeSettings>"#,
        )
        .unwrap();

    let mut cmd = cargo_bin_cmd!("slnmerge");
    cmd.arg("merge")
        .arg(temp.child("Unity/App.sln").path())
        .assert()
        .success();

    temp.child("Unity/App.sln")
        .assert(predicate::str::contains("Server.csproj"))
        .assert(predicate::str::contains(
            "{053476FC-B8B2-4A14-AED2-3733DFD5DFC3} = {F95BC0CF-E609-419F-B0A0-019BD5783670}",
        ));
}

#[test]
fn test_merge_dry_run_leaves_file() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("App.sln").write_str(UNITY_SLN).unwrap();
    temp.child("App.Merge.sln").write_str(SERVER_SLN).unwrap();

    let mut cmd = cargo_bin_cmd!("slnmerge");
    cmd.arg("merge")
        .arg(temp.child("App.sln").path())
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nantoka.Server"));

    temp.child("App.sln").assert(UNITY_SLN);
}

#[test]
fn test_merge_to_output_file() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("App.sln").write_str(UNITY_SLN).unwrap();
    temp.child("Other.sln").write_str(SERVER_SLN).unwrap();

    let mut cmd = cargo_bin_cmd!("slnmerge");
    cmd.arg("merge")
        .arg(temp.child("App.sln").path())
        .arg("--overlay")
        .arg(temp.child("Other.sln").path())
        .arg("--output")
        .arg(temp.child("Merged.sln").path())
        .assert()
        .success();

    temp.child("App.sln").assert(UNITY_SLN);
    temp.child("Merged.sln")
        .assert(predicate::str::contains("Nantoka.Server"));
}

#[test]
fn test_merge_missing_overlay_warns() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("App.sln").write_str(UNITY_SLN).unwrap();

    let mut cmd = cargo_bin_cmd!("slnmerge");
    cmd.arg("merge")
        .arg(temp.child("App.sln").path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Cannot load the solution file to merge"));

    temp.child("App.sln").assert(UNITY_SLN);
}

#[test]
fn test_merge_disabled() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("App.sln").write_str(UNITY_SLN).unwrap();
    temp.child("App.Merge.sln").write_str(SERVER_SLN).unwrap();
    temp.child("App.sln.mergesettings")
        .write_str("<SlnMergeSettings><Disabled>true</Disabled></SlnMergeSettings>")
        .unwrap();

    let mut cmd = cargo_bin_cmd!("slnmerge");
    cmd.arg("merge")
        .arg(temp.child("App.sln").path())
        .assert()
        .success()
        .stderr(predicate::str::contains("SlnMerge is currently disabled"));

    temp.child("App.sln").assert(UNITY_SLN);
}

#[test]
fn test_merge_failure_exits_nonzero() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("App.sln").write_str(UNITY_SLN).unwrap();
    temp.child("App.Merge.sln")
        .write_str("Project(\"{X}\") = \"A\", \"A.csproj\", \"{A}\"\n")
        .unwrap();

    let mut cmd = cargo_bin_cmd!("slnmerge");
    cmd.arg("merge")
        .arg(temp.child("App.sln").path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to merge"));

    temp.child("App.sln").assert(UNITY_SLN);
}

#[test]
fn test_merge_unsupported_extension() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("App.txt").write_str("hello").unwrap();

    let mut cmd = cargo_bin_cmd!("slnmerge");
    cmd.arg("merge")
        .arg(temp.child("App.txt").path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported solution format"));
}

#[test]
fn test_diff_reports_added_project() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("App.sln").write_str(UNITY_SLN).unwrap();
    temp.child("App.Merge.sln").write_str(SERVER_SLN).unwrap();
    temp.child("Assembly-CSharp.csproj")
        .write_str("<Project><PropertyGroup /></Project>")
        .unwrap();

    let mut cmd = cargo_bin_cmd!("slnmerge");
    cmd.arg("diff")
        .arg(temp.child("App.sln").path())
        .arg(temp.child("App.Merge.sln").path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Added projects:"))
        .stdout(predicate::str::contains("+ {1E7138DC-D3E2-51A8-4059-67524470B2E7}"))
        .stdout(predicate::str::contains("- {053476FC-B8B2-4A14-AED2-3733DFD5DFC3}"));
}

#[test]
fn test_diff_json_skips_unity_projects() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("App.sln").write_str(UNITY_SLN).unwrap();
    temp.child("App.Merge.sln").write_str(SERVER_SLN).unwrap();
    temp.child("Assembly-CSharp.csproj")
        .write_str(
            "<Project><PropertyGroup><ProjectTypeGuids>{E097FAD1-6243-4DAD-9C02-E9B9EFC3FFC1};{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}</ProjectTypeGuids></PropertyGroup></Project>",
        )
        .unwrap();

    let mut cmd = cargo_bin_cmd!("slnmerge");
    cmd.arg("diff")
        .arg(temp.child("App.sln").path())
        .arg(temp.child("App.Merge.sln").path())
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""additions": []"#))
        .stdout(predicate::str::contains("{053476FC-B8B2-4A14-AED2-3733DFD5DFC3}"));
}
