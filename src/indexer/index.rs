// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tantivy index over transcripts in text form

use anyhow::{Context, Result};
use chrono::NaiveTime;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tantivy::{
    collector::DocSetCollector,
    doc,
    query::AllQuery,
    schema::{
        DateOptions, Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, Value,
        STORED, STRING,
    },
    tokenizer::{Language, LowerCaser, RemoveLongFilter, SimpleTokenizer, Stemmer, TextAnalyzer},
    DateTime, Index, IndexWriter, TantivyDocument, Term,
};

use crate::indexer::scanner::TranscriptScanner;
use subgrep::engine::TranscriptPair;
use subgrep::errors::UnsupportedLanguageError;
use subgrep::utils::{index_dir, read_text_file_content, save_text_file_content};
use subgrep::video::VideoInfo;

/// Bump when the schema or analyzer chain changes.
const SCHEMA_VERSION: &str = "1";
const SCHEMA_VERSION_FILE: &str = "schema.version";
const ANALYZER_NAME: &str = "transcript";
const WRITER_HEAP_BYTES: usize = 50_000_000;
/// Tokens longer than this are dropped (URLs, garbage from auto captions).
const MAX_TOKEN_LEN: usize = 40;

const LANGUAGES: &[(&str, Language)] = &[
    ("arabic", Language::Arabic),
    ("danish", Language::Danish),
    ("dutch", Language::Dutch),
    ("english", Language::English),
    ("finnish", Language::Finnish),
    ("french", Language::French),
    ("german", Language::German),
    ("greek", Language::Greek),
    ("hungarian", Language::Hungarian),
    ("italian", Language::Italian),
    ("norwegian", Language::Norwegian),
    ("portuguese", Language::Portuguese),
    ("romanian", Language::Romanian),
    ("russian", Language::Russian),
    ("spanish", Language::Spanish),
    ("swedish", Language::Swedish),
    ("tamil", Language::Tamil),
    ("turkish", Language::Turkish),
];

pub fn parse_language(name: &str) -> Result<Language, UnsupportedLanguageError> {
    let wanted = name.trim().to_lowercase();
    LANGUAGES
        .iter()
        .find(|(candidate, _)| *candidate == wanted)
        .map(|(_, language)| *language)
        .ok_or_else(|| UnsupportedLanguageError {
            language: name.to_string(),
            supported: LANGUAGES.iter().map(|(n, _)| n.to_string()).collect(),
        })
}

fn build_analyzer(language: Language) -> TextAnalyzer {
    TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(MAX_TOKEN_LEN))
        .filter(LowerCaser)
        .filter(Stemmer::new(language))
        .build()
}

pub fn build_schema() -> Schema {
    let mut builder = Schema::builder();

    let stemmed = TextFieldIndexing::default()
        .set_tokenizer(ANALYZER_NAME)
        .set_index_option(IndexRecordOption::WithFreqsAndPositions);

    builder.add_text_field(
        "title",
        TextOptions::default()
            .set_indexing_options(stemmed.clone())
            .set_stored(),
    );
    builder.add_text_field("id", STRING | STORED);
    builder.add_text_field("upload_date", STRING | STORED);
    builder.add_date_field(
        "date",
        DateOptions::default().set_indexed().set_stored().set_fast(),
    );
    // content is reread from disk when fragments are built
    builder.add_text_field(
        "content",
        TextOptions::default().set_indexing_options(stemmed),
    );
    builder.add_text_field("path", STRING | STORED);
    builder.add_text_field("timecodes_path", STRING | STORED);
    builder.add_u64_field("mtime", STORED);
    builder.build()
}

/// Resolved schema fields.
#[derive(Debug, Clone, Copy)]
pub struct IndexFields {
    pub title: Field,
    pub id: Field,
    pub upload_date: Field,
    pub date: Field,
    pub content: Field,
    pub path: Field,
    pub timecodes_path: Field,
    pub mtime: Field,
}

impl IndexFields {
    pub fn from_schema(schema: &Schema) -> Result<Self> {
        let field = |name: &str| {
            schema
                .get_field(name)
                .with_context(|| format!("Missing {name} field"))
        };
        Ok(Self {
            title: field("title")?,
            id: field("id")?,
            upload_date: field("upload_date")?,
            date: field("date")?,
            content: field("content")?,
            path: field("path")?,
            timecodes_path: field("timecodes_path")?,
            mtime: field("mtime")?,
        })
    }
}

/// An opened transcript index with its analyzer registered.
pub struct TranscriptIndex {
    pub index: Index,
    pub fields: IndexFields,
    pub text_root: PathBuf,
}

impl TranscriptIndex {
    fn wrap(index: Index, text_root: &Path, language: Language) -> Result<Self> {
        index
            .tokenizers()
            .register(ANALYZER_NAME, build_analyzer(language));
        let fields = IndexFields::from_schema(&index.schema())?;
        Ok(Self {
            index,
            fields,
            text_root: text_root.to_path_buf(),
        })
    }

    /// Absolute path of a stored relative path.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.text_root.join(relative)
    }

    /// Stored string value of `field`, empty when absent.
    pub fn stored_str(doc: &TantivyDocument, field: Field) -> String {
        doc.get_first(field)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndexStats {
    pub added: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    pub rebuilt: bool,
}

impl IndexStats {
    fn changed(&self) -> bool {
        self.added + self.updated + self.deleted > 0 || self.rebuilt
    }
}

/// Creates or incrementally refreshes the index of one text form root.
pub struct IndexBuilder {
    text_root: PathBuf,
    language_name: String,
    language: Language,
}

impl IndexBuilder {
    pub fn new(text_root: impl AsRef<Path>, language_name: &str) -> Result<Self> {
        let language = parse_language(language_name)?;
        Ok(Self {
            text_root: text_root.as_ref().to_path_buf(),
            language_name: language_name.trim().to_lowercase(),
            language,
        })
    }

    fn version_stamp(&self) -> String {
        format!("{SCHEMA_VERSION}:{}", self.language_name)
    }

    fn is_current(&self, index_path: &Path) -> bool {
        read_text_file_content(&index_path.join(SCHEMA_VERSION_FILE))
            .is_some_and(|stamp| stamp.trim() == self.version_stamp())
    }

    /// Bring the index in line with the transcripts on disk.
    pub fn build(&self, force: bool) -> Result<(TranscriptIndex, IndexStats)> {
        let index_path = index_dir(&self.text_root);
        let mut stats = IndexStats::default();

        let rebuild = force || !self.is_current(&index_path);
        if rebuild && index_path.exists() {
            tracing::info!("rebuilding index at {}", index_path.display());
            fs::remove_dir_all(&index_path)
                .with_context(|| format!("Failed to remove {}", index_path.display()))?;
        }

        let index = if rebuild {
            stats.rebuilt = true;
            fs::create_dir_all(&index_path)
                .with_context(|| format!("Failed to create {}", index_path.display()))?;
            Index::create_in_dir(&index_path, build_schema()).context("Failed to create index")?
        } else {
            Index::open_in_dir(&index_path).context("Failed to open index")?
        };
        let transcript_index = TranscriptIndex::wrap(index, &self.text_root, self.language)?;

        let indexed = if rebuild {
            HashMap::new()
        } else {
            indexed_mtimes(&transcript_index)?
        };
        let on_disk = TranscriptScanner::new(&self.text_root).list_transcripts()?;

        let mut writer: IndexWriter = transcript_index
            .index
            .writer(WRITER_HEAP_BYTES)
            .context("Failed to create index writer")?;
        let fields = transcript_index.fields;

        let bar = ProgressBar::new(on_disk.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_message("Indexing transcripts");

        let mut seen = HashSet::with_capacity(on_disk.len());
        for transcript in &on_disk {
            bar.inc(1);
            let relative = relative_path(&self.text_root, transcript)?;
            let mtime = modified_secs(transcript);
            match indexed.get(&relative) {
                Some(&indexed_mtime) if indexed_mtime == mtime => stats.unchanged += 1,
                Some(_) => {
                    writer.delete_term(Term::from_field_text(fields.path, &relative));
                    self.add_document(&writer, &fields, transcript, &relative, mtime)?;
                    stats.updated += 1;
                }
                None => {
                    self.add_document(&writer, &fields, transcript, &relative, mtime)?;
                    stats.added += 1;
                }
            }
            seen.insert(relative);
        }
        bar.finish_and_clear();

        for relative in indexed.keys() {
            if !seen.contains(relative) {
                writer.delete_term(Term::from_field_text(fields.path, relative));
                stats.deleted += 1;
            }
        }

        if stats.changed() {
            writer.commit().context("Failed to commit index")?;
        }
        writer
            .wait_merging_threads()
            .context("Failed to finish index merges")?;
        save_text_file_content(&index_path.join(SCHEMA_VERSION_FILE), &self.version_stamp())?;

        tracing::info!(
            "index updated: {} added, {} updated, {} deleted, {} unchanged",
            stats.added,
            stats.updated,
            stats.deleted,
            stats.unchanged
        );
        Ok((transcript_index, stats))
    }

    fn add_document(
        &self,
        writer: &IndexWriter,
        fields: &IndexFields,
        transcript: &Path,
        relative: &str,
        mtime: u64,
    ) -> Result<()> {
        let pair = TranscriptPair::for_transcript(transcript);
        let info = VideoInfo::load(&pair.info_path())?;
        let upload = info.upload_date()?;
        let timestamp = upload.and_time(NaiveTime::MIN).and_utc().timestamp();
        let content = fs::read_to_string(transcript)
            .with_context(|| format!("Failed to read {}", transcript.display()))?;
        let timecodes_relative = relative_path(&self.text_root, &pair.timecodes)?;

        writer.add_document(doc!(
            fields.title => info.title,
            fields.id => info.id,
            fields.upload_date => info.upload_date,
            fields.date => DateTime::from_timestamp_secs(timestamp),
            fields.content => content,
            fields.path => relative.to_string(),
            fields.timecodes_path => timecodes_relative,
            fields.mtime => mtime,
        ))?;
        Ok(())
    }
}

/// Stored modification times keyed by relative transcript path.
fn indexed_mtimes(transcript_index: &TranscriptIndex) -> Result<HashMap<String, u64>> {
    let reader = transcript_index
        .index
        .reader()
        .context("Failed to create index reader")?;
    let searcher = reader.searcher();
    let fields = transcript_index.fields;

    let mut mtimes = HashMap::new();
    for address in searcher.search(&AllQuery, &DocSetCollector)? {
        let doc: TantivyDocument = searcher.doc(address)?;
        let path = TranscriptIndex::stored_str(&doc, fields.path);
        let mtime = doc
            .get_first(fields.mtime)
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        mtimes.insert(path, mtime);
    }
    Ok(mtimes)
}

fn relative_path(root: &Path, path: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(root)
        .with_context(|| format!("{} is outside {}", path.display(), root.display()))?;
    Ok(relative.to_string_lossy().replace('\\', "/"))
}

fn modified_secs(path: &Path) -> u64 {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
