// SPDX-License-Identifier: MIT OR Apache-2.0

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const TALK_VTT: &str = "WEBVTT\nKind: captions\nLanguage: en\n\n\
00:00:01.000 --> 00:00:04.000\nwe say hello\n\n\
00:00:12.000 --> 00:00:15.000\nworld today\n\n\
00:01:40.000 --> 00:01:42.000\nthe needle is here\n";

const TALK_INFO: &str = r#"{
  "id": "vid123",
  "title": "Talk",
  "upload_date": "20240301",
  "channel": "Chan",
  "formats": []
}"#;

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, content).expect("write file");
}

fn fixture() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    let video_dir = dir.path().join("subs/@chan/2024/20240301_Talk");
    write_file(&video_dir.join("Talk.ru.vtt"), TALK_VTT);
    write_file(&video_dir.join("Talk.info.json"), TALK_INFO);
    dir
}

fn subgrep(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("subgrep"));
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env_remove("RUST_LOG");
    cmd
}

fn search_json(dir: &TempDir, args: &[&str]) -> Value {
    let assert = subgrep(dir)
        .args(["search", "-d", "subs", "-f", "json"])
        .args(args)
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    serde_json::from_str(&stdout).expect("json output")
}

#[test]
fn default_engine_finds_plain_text_case_insensitively() {
    let dir = fixture();
    let results = search_json(&dir, &["NEEDLE IS"]);

    let videos = results.as_array().expect("array");
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0]["video_id"], "vid123");
    assert_eq!(videos[0]["video_title"], "Talk");
    assert_eq!(videos[0]["video_upload_date"], "20240301");
    let hit = &videos[0]["timecode_info_list"][0];
    assert_eq!(hit["timecode_seconds"], 100);
    assert_eq!(hit["url"], "https://youtu.be/vid123?t=100");
    assert_eq!(hit["context"][0], "the needle is here");

    let text_root = dir.path().join("subs/subs_in_text_form/@chan/2024/20240301_Talk");
    assert!(text_root.join("Talk.ru.txt").exists());
    assert!(text_root.join("Talk.ru.timecodes.txt").exists());
    assert!(text_root.join("Talk.info.json").exists());
}

#[test]
fn default_engine_does_not_interpret_regex_syntax() {
    let dir = fixture();
    let results = search_json(&dir, &["n..dle"]);
    assert_eq!(results, Value::Array(vec![]));
}

#[test]
fn regex_engine_returns_surrounding_context() {
    let dir = fixture();
    let results = search_json(&dir, &["-e", "regex", "wor.d", "-C", "3"]);

    let hit = &results[0]["timecode_info_list"][0];
    assert_eq!(hit["timecode_seconds"], 12);
    assert_eq!(
        hit["context"],
        serde_json::json!(["we say hello", "world today", "the needle is here"])
    );
}

#[test]
fn line_edges_find_text_split_between_lines() {
    let dir = fixture();

    let without = search_json(&dir, &["hello world"]);
    assert_eq!(without, Value::Array(vec![]));

    let with = search_json(&dir, &["hello world", "--search-on-line-edges"]);
    let hits = with[0]["timecode_info_list"].as_array().expect("hits");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["timecode_seconds"], 1);
}

#[test]
fn text_output_lists_video_and_timecodes() {
    let dir = fixture();
    subgrep(&dir)
        .args(["s", "needle", "-d", "subs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("20240301 Talk"))
        .stdout(predicate::str::contains(
            "    0:01:40 https://youtu.be/vid123?t=100 the needle is here",
        ));
}

#[test]
fn html_output_is_written_to_file() {
    let dir = fixture();
    subgrep(&dir)
        .args(["search", "needle", "-d", "subs", "--format", "html", "-o", "out.html"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let html = fs::read_to_string(dir.path().join("out.html")).expect("html file");
    assert!(html.contains("<!DOCTYPE html>"));
    assert!(html.contains("vid123?t=100\">0:01:40</a>the needle is here"));
}

#[test]
fn index_engine_matches_stemmed_word_forms() {
    let dir = fixture();
    write_file(&dir.path().join(".subgreprc.toml"), "stemmer_language = \"english\"\n");

    let results = search_json(&dir, &["-e", "index", "needles"]);
    let hits = results[0]["timecode_info_list"].as_array().expect("hits");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["timecode_seconds"], 100);
    assert!(dir
        .path()
        .join("subs/subs_in_text_form/index/schema.version")
        .exists());
}

#[test]
fn missing_source_is_a_usage_error() {
    let dir = fixture();
    subgrep(&dir)
        .args(["search", "needle"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--searching-directory"));
}

#[test]
fn channel_url_without_handle_is_rejected() {
    let dir = fixture();
    subgrep(&dir)
        .args([
            "search",
            "needle",
            "--youtube-channel-url",
            "https://www.youtube.com/channel/UC123",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not supported"));
}

#[test]
fn misaligned_timecodes_fail_and_name_the_pair() {
    let dir = fixture();
    search_json(&dir, &["needle"]);

    let timecodes = dir
        .path()
        .join("subs/subs_in_text_form/@chan/2024/20240301_Talk/Talk.ru.timecodes.txt");
    fs::write(&timecodes, "00:00:01 1\n").expect("truncate timecodes");

    subgrep(&dir)
        .args(["search", "needle", "-d", "subs"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Talk.ru.timecodes.txt"));
}
