use bson::Document;

use super::cursor::Cursor;
use super::eval::{compare_docs, eval_filter, project_fields};
use super::types::{Filter, FindOptions};

/// Run a find over an in-memory document slice: filter, sort, skip/limit, then project.
pub fn find_docs(collection: &str, docs: &[Document], filter: &Filter, opts: &FindOptions) -> Cursor {
    let bench_start = std::time::Instant::now();

    let mut matched: Vec<&Document> = docs.iter().filter(|d| eval_filter(d, filter)).collect();
    if !opts.sort.is_empty() {
        matched.sort_by(|a, b| compare_docs(a, b, &opts.sort));
    }

    let skip = usize::try_from(opts.skip).unwrap_or(usize::MAX);
    let limit = match opts.limit {
        0 => usize::MAX,
        n => usize::try_from(n).unwrap_or(usize::MAX),
    };
    let out: Vec<Document> = matched
        .into_iter()
        .skip(skip)
        .take(limit)
        .map(|d| match &opts.projection {
            Some(p) => project_fields(d, p),
            None => d.clone(),
        })
        .collect();

    crate::qlog!(
        "{{\"bench\":\"query\",\"op\":\"find\",\"collection\":\"{}\",\"duration_ms\":{},\"result_count\":{},\"limit\":{},\"skip\":{}}}",
        collection,
        bench_start.elapsed().as_millis(),
        out.len(),
        opts.limit,
        opts.skip
    );
    Cursor::from_documents(out)
}

#[must_use]
pub fn count_docs(collection: &str, docs: &[Document], filter: &Filter) -> u64 {
    let start = std::time::Instant::now();
    let n = docs.iter().filter(|d| eval_filter(d, filter)).count() as u64;
    crate::qlog!(
        "{{\"bench\":\"query\",\"op\":\"count\",\"collection\":\"{}\",\"duration_ms\":{},\"result_count\":{}}}",
        collection,
        start.elapsed().as_millis(),
        n
    );
    n
}
