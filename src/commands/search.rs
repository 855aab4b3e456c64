use std::cmp::Reverse;
use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::cli::SearchArgs;
use crate::model::SearchRecord;
use crate::store;
use crate::util::{now_epoch_millis, write_json_stdout};

const MAX_RESULTS: usize = 8;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CatalogDoc {
    pub id: &'static str,
    pub title: &'static str,
    pub desc: &'static str,
    pub domain: &'static str,
}

static CATALOG: [CatalogDoc; 8] = [
    CatalogDoc {
        id: "r1",
        title: "Top 10 budget wireless earbuds",
        desc: "Picks by price band with battery comparison",
        domain: "soundpick.example",
    },
    CatalogDoc {
        id: "r2",
        title: "Bluetooth earbuds deals roundup",
        desc: "This week's discounts at a glance",
        domain: "salehub.example",
    },
    CatalogDoc {
        id: "r3",
        title: "Noise cancelling starter guide",
        desc: "How ANC works and recommended models",
        domain: "techwiki.example",
    },
    CatalogDoc {
        id: "r4",
        title: "Sweat-proof earbuds for workouts",
        desc: "IPX water resistance ratings and fit",
        domain: "fitgear.example",
    },
    CatalogDoc {
        id: "r5",
        title: "20 best gifts for friends",
        desc: "Gift ideas for a mid-range budget",
        domain: "giftmap.example",
    },
    CatalogDoc {
        id: "r6",
        title: "Making earbud batteries last",
        desc: "Charging tips and storage habits",
        domain: "caretips.example",
    },
    CatalogDoc {
        id: "r7",
        title: "Latest true wireless comparison table",
        desc: "Chipset, codec and latency compared",
        domain: "specs.example",
    },
    CatalogDoc {
        id: "r8",
        title: "Open-fit vs in-ear",
        desc: "Pros, cons and which to pick when",
        domain: "audio101.example",
    },
];

#[derive(Debug, Serialize)]
struct SearchResponse<'a> {
    ok: bool,
    query: &'a str,
    results: Vec<&'static CatalogDoc>,
}

pub fn run(args: SearchArgs, db_path: &Path) -> Result<()> {
    let query = args.query.trim().to_string();
    let results = rank(&query);

    let record = SearchRecord {
        user_id: args.user_id,
        session_id: args.session_id,
        query_text: query,
        result_count: results.len() as i64,
        ts: None,
    };
    record.validate()?;

    let connection = store::open_store(db_path)?;
    store::insert_search(&connection, &record, now_epoch_millis())?;
    info!(
        session_id = %record.session_id,
        query = %record.query_text,
        result_count = record.result_count,
        "logged search"
    );

    if args.json {
        return write_json_stdout(&SearchResponse {
            ok: true,
            query: &record.query_text,
            results,
        });
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    writeln!(output, "Query: {}", record.query_text)?;
    for (index, doc) in results.iter().enumerate() {
        writeln!(output, "{}.\t{}\t{}\t{}", index + 1, doc.id, doc.title, doc.domain)?;
        writeln!(output, "\t{}", doc.desc)?;
    }
    output.flush()?;
    Ok(())
}

/// Score each catalog entry by how many query tokens appear in its title or
/// description; ties fall back to document id.
pub fn rank(query: &str) -> Vec<&'static CatalogDoc> {
    let tokens: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();

    let mut scored: Vec<(usize, &'static CatalogDoc)> = CATALOG
        .iter()
        .map(|doc| (score(doc, &tokens), doc))
        .collect();
    scored.sort_by_key(|(score, doc)| (Reverse(*score), doc.id));

    scored
        .into_iter()
        .take(MAX_RESULTS)
        .map(|(_, doc)| doc)
        .collect()
}

fn score(doc: &CatalogDoc, tokens: &[String]) -> usize {
    let text = format!("{} {}", doc.title, doc.desc).to_lowercase();
    1 + tokens
        .iter()
        .filter(|token| text.contains(token.as_str()))
        .count()
}
