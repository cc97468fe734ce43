// SPDX-License-Identifier: MIT OR Apache-2.0

//! Full-text search with stemming using tantivy

use anyhow::{anyhow, Context, Result};
use std::collections::HashSet;
use std::fs;
use tantivy::{
    collector::TopDocs,
    query::{Query, QueryParser},
    schema::Field,
    tokenizer::{TextAnalyzer, TokenStream},
    DateTime, DocAddress, Order, TantivyDocument,
};

use crate::cli::SortBy;
use crate::indexer::TranscriptIndex;
use subgrep::engine::{Fragment, ScanOptions, TranscriptPair};
use subgrep::video::{VideoInfo, VideoTimecodes};

/// Fragments taken from one video when no limit is given.
pub const DEFAULT_RESULTS_LIMIT: usize = 99_999;

/// Stemmed query terms that target `field`.
fn query_terms(query: &dyn Query, field: Field) -> HashSet<String> {
    let mut terms = HashSet::new();
    query.query_terms(&mut |term, _| {
        if term.field() == field {
            if let Some(text) = term.value().as_str() {
                terms.insert(text.to_string());
            }
        }
    });
    terms
}

/// Spans of `content` whose analyzed token is one of `terms`, in text order.
pub fn find_fragments(
    analyzer: &mut TextAnalyzer,
    content: &str,
    terms: &HashSet<String>,
    limit: usize,
) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    let mut stream = analyzer.token_stream(content);
    while fragments.len() < limit && stream.advance() {
        let token = stream.token();
        if terms.contains(&token.text) {
            fragments.push(Fragment::new(
                token.offset_from,
                token.offset_to,
                &content[token.offset_from..token.offset_to],
            ));
        }
    }
    fragments
}

/// Run `query_text` against the index and correlate every hit with its timecodes.
pub fn search(
    index: &TranscriptIndex,
    query_text: &str,
    sort_by: SortBy,
    results_limit: Option<usize>,
    options: &ScanOptions,
) -> Result<Vec<Result<VideoTimecodes>>> {
    let fields = index.fields;
    let reader = index
        .index
        .reader()
        .context("Failed to create index reader")?;
    let searcher = reader.searcher();

    let mut parser = QueryParser::for_index(&index.index, vec![fields.content]);
    // every word of a plain query must occur in the video
    parser.set_conjunction_by_default();
    let query = parser
        .parse_query(query_text)
        .map_err(|e| anyhow!("Invalid index query '{}': {}", query_text, e))?;

    let limit = usize::try_from(searcher.num_docs()).unwrap_or(usize::MAX).max(1);
    let addresses: Vec<DocAddress> = match sort_by {
        SortBy::UploadDate => searcher
            .search(
                &query,
                &TopDocs::with_limit(limit).order_by_fast_field::<DateTime>("date", Order::Desc),
            )?
            .into_iter()
            .map(|(_, address)| address)
            .collect(),
        SortBy::Relevance => searcher
            .search(&query, &TopDocs::with_limit(limit))?
            .into_iter()
            .map(|(_, address)| address)
            .collect(),
    };
    tracing::debug!("index query '{}' matched {} videos", query_text, addresses.len());

    let terms = query_terms(query.as_ref(), fields.content);
    let mut analyzer = index.index.tokenizer_for_field(fields.content)?;
    let fragment_limit = results_limit.unwrap_or(DEFAULT_RESULTS_LIMIT);

    let mut results = Vec::new();
    for address in addresses {
        let doc: TantivyDocument = searcher.doc(address)?;
        let result = correlate_hit(index, &doc, &mut analyzer, &terms, fragment_limit, options);
        match result {
            Ok(Some(video)) => results.push(Ok(video)),
            Ok(None) => {}
            Err(err) => {
                results.push(Err(err));
                break;
            }
        }
    }
    Ok(results)
}

fn correlate_hit(
    index: &TranscriptIndex,
    doc: &TantivyDocument,
    analyzer: &mut TextAnalyzer,
    terms: &HashSet<String>,
    fragment_limit: usize,
    options: &ScanOptions,
) -> Result<Option<VideoTimecodes>> {
    let fields = index.fields;
    let pair = TranscriptPair {
        transcript: index.resolve(&TranscriptIndex::stored_str(doc, fields.path)),
        timecodes: index.resolve(&TranscriptIndex::stored_str(doc, fields.timecodes_path)),
    };
    let content = fs::read_to_string(&pair.transcript)
        .with_context(|| format!("Failed to read {}", pair.transcript.display()))?;

    let fragments = find_fragments(analyzer, &content, terms, fragment_limit);
    if fragments.is_empty() {
        return Ok(None);
    }

    let records = pair.walk_fragments(&content, &fragments, options)?;
    let video = VideoInfo {
        id: TranscriptIndex::stored_str(doc, fields.id),
        title: TranscriptIndex::stored_str(doc, fields.title),
        upload_date: TranscriptIndex::stored_str(doc, fields.upload_date),
    };
    Ok(VideoTimecodes::from_records(video, records))
}
