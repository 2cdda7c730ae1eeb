//! Reader and writer for the LDA-C corpus format
//!
//! Every line holds one document: the number of distinct terms followed by
//! that many whitespace separated `term:count` pairs, for example
//!
//! ```text
//! 3 0:2 4:1 7:5
//! ```
//!
//! Blank lines are skipped, a line containing just `0` is an empty document.

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use crate::{
    corpus::{num_terms, Document, SparseDocument},
    error::{LdaError, Result},
};

/// Whether term ids in a file start at zero or one.
///
/// Documents in memory always use zero-based ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TermIndexing {
    #[default]
    ZeroBased,
    OneBased,
}

impl TermIndexing {
    fn offset(self) -> usize {
        match self {
            TermIndexing::ZeroBased => 0,
            TermIndexing::OneBased => 1,
        }
    }
}

/// Parse an LDA-C corpus.
pub fn read_ldac<R: BufRead>(reader: R, indexing: TermIndexing) -> Result<Vec<SparseDocument>> {
    let mut docs = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        docs.push(parse_line(&line, idx + 1, indexing)?);
    }
    tracing::debug!(
        n_docs = docs.len(),
        n_terms = num_terms(&docs),
        "read LDA-C corpus"
    );
    Ok(docs)
}

/// Parse the LDA-C corpus in the file at `path`.
pub fn read_ldac_file<P: AsRef<Path>>(
    path: P,
    indexing: TermIndexing,
) -> Result<Vec<SparseDocument>> {
    let file = File::open(path.as_ref())?;
    read_ldac(BufReader::new(file), indexing)
}

/// Write documents in LDA-C format, one line per document.
///
/// Repeated term ids of a document are merged and zero counts are dropped.
pub fn write_ldac<W: Write, D: Document>(
    mut writer: W,
    docs: &[D],
    indexing: TermIndexing,
) -> Result<()> {
    let offset = indexing.offset();
    for doc in docs {
        let doc = SparseDocument::new(doc.term_counts());
        write!(writer, "{}", doc.num_distinct())?;
        for &(term, count) in doc.terms() {
            write!(writer, " {}:{}", term + offset, count)?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write documents in LDA-C format to the file at `path`.
pub fn write_ldac_file<P: AsRef<Path>, D: Document>(
    path: P,
    docs: &[D],
    indexing: TermIndexing,
) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_ldac(BufWriter::new(file), docs, indexing)
}

fn parse_line(line: &str, line_no: usize, indexing: TermIndexing) -> Result<SparseDocument> {
    let error = |message: String| LdaError::Parse {
        line: line_no,
        message,
    };

    let mut fields = line.split_whitespace();
    let header = fields.next().unwrap_or_default();
    let num_distinct: usize = header
        .parse()
        .map_err(|_| error(format!("invalid number of terms {header:?}")))?;

    let pairs = fields
        .map(|field| {
            let (term, count) = field
                .split_once(':')
                .ok_or_else(|| error(format!("expected term:count, found {field:?}")))?;
            let term: usize = term
                .parse()
                .map_err(|_| error(format!("invalid term id {term:?}")))?;
            let count: usize = count
                .parse()
                .map_err(|_| error(format!("invalid count {count:?}")))?;
            let term = term
                .checked_sub(indexing.offset())
                .ok_or_else(|| error("term id 0 in a one-based file".into()))?;
            Ok((term, count))
        })
        .collect::<Result<Vec<_>>>()?;

    if pairs.len() != num_distinct {
        return Err(error(format!(
            "line announces {num_distinct} terms but contains {}",
            pairs.len()
        )));
    }
    Ok(SparseDocument::new(pairs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CORPUS: &str = "2 0:2 1:1\n1 2:3\n\n0\n3 4:1 0:1 4:2\n";

    #[test]
    fn read_corpus() {
        let docs = read_ldac(CORPUS.as_bytes(), TermIndexing::ZeroBased).unwrap();
        assert_eq!(docs.len(), 4);
        assert_eq!(docs[0].terms(), &[(0, 2), (1, 1)]);
        assert_eq!(docs[1].terms(), &[(2, 3)]);
        assert!(docs[2].is_empty());
        assert_eq!(docs[3].terms(), &[(0, 1), (4, 3)]);
        assert_eq!(num_terms(&docs), 5);
    }

    #[test]
    fn one_based_ids() {
        let docs = read_ldac("2 1:2 3:1\n".as_bytes(), TermIndexing::OneBased).unwrap();
        assert_eq!(docs[0].terms(), &[(0, 2), (2, 1)]);

        let err = read_ldac("1 0:1\n".as_bytes(), TermIndexing::OneBased).unwrap_err();
        assert!(matches!(err, LdaError::Parse { line: 1, .. }));
    }

    #[test]
    fn malformed_lines() {
        for (input, line) in [
            ("x 0:1\n", 1),
            ("1 0:1\n2 0:1\n", 2),
            ("1 0-1\n", 1),
            ("1 a:1\n", 1),
            ("1 0:-1\n", 1),
            ("0\n\n1 0:1 1:1\n", 3),
        ] {
            let err = read_ldac(input.as_bytes(), TermIndexing::ZeroBased).unwrap_err();
            match err {
                LdaError::Parse { line: found, .. } => assert_eq!(found, line, "{input:?}"),
                other => panic!("unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn write_then_read() {
        let docs = read_ldac(CORPUS.as_bytes(), TermIndexing::ZeroBased).unwrap();
        let mut out = Vec::new();
        write_ldac(&mut out, &docs, TermIndexing::OneBased).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "2 1:2 2:1\n1 3:3\n0\n2 1:1 5:3\n");

        let again = read_ldac(text.as_bytes(), TermIndexing::OneBased).unwrap();
        assert_eq!(again, docs);
    }
}
