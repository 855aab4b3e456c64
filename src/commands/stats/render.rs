use std::fmt::Write;

use super::*;

pub(super) fn render_text(report: &CtrReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Valid sessions (>=1 search): {}", report.valid_sessions);
    let _ = writeln!(
        out,
        "Groups: {}\tinterval: Wilson {}",
        report.rows.len(),
        confidence_label(report.z)
    );

    for row in &report.rows {
        let _ = writeln!(
            out,
            "{}\t{}\t{}\timps={}\tclicks={}\tctr={}\tci={}{}",
            row.variant,
            row.placement,
            row.creative_id,
            row.impressions,
            row.clicks,
            format_percent(row.ctr),
            format_interval(row),
            if row.clicks_exceed_impressions {
                "\t(clicks exceed impressions)"
            } else {
                ""
            }
        );
    }

    out
}

pub(super) fn render_html(report: &CtrReport) -> String {
    let mut out = String::new();
    out.push_str("<html><head><meta charset='utf-8'><title>CTR Dashboard</title>\n");
    out.push_str(
        "<style>body{font-family:system-ui;padding:24px} table{border-collapse:collapse} \
         td,th{padding:8px 10px;border:1px solid #ddd} \
         .mono{font-variant-numeric:tabular-nums} .badge{color:#666}</style>\n",
    );
    out.push_str("</head><body><h1>CTR Dashboard</h1>\n");
    let _ = writeln!(
        out,
        "<p class='badge'>Valid sessions (&gt;=1 search): <b>{}</b></p>",
        report.valid_sessions
    );
    let _ = writeln!(
        out,
        "<table><tr><th>Variant</th><th>Placement</th><th>Creative</th><th>Imps</th>\
         <th>Clicks</th><th>CTR</th><th>{} CI</th></tr>",
        escape_html(&confidence_label(report.z))
    );

    for row in &report.rows {
        let _ = writeln!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td class='mono'>{}</td>\
             <td class='mono'>{}</td><td class='mono'>{}</td><td class='mono'>{}</td></tr>",
            escape_html(&row.variant),
            escape_html(&row.placement),
            escape_html(&row.creative_id),
            row.impressions,
            row.clicks,
            format_percent(row.ctr),
            format_interval(row)
        );
    }

    out.push_str(
        "</table><p class='badge' style='margin-top:16px'>Wilson interval. \
         Refresh to update.</p></body></html>\n",
    );
    out
}

pub(super) fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
