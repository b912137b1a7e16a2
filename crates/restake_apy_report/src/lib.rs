//! Static HTML report for an APY snapshot.

use restake_apy::report::ProtocolReport;
use restake_apy::ReportData;
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

/// Render a static HTML report to `out_path`. Embeds the full snapshot JSON for verification.
pub fn render_report(data: &ReportData, out_path: impl AsRef<Path>) -> Result<(), ReportError> {
    let html = build_html(data)?;
    let mut f = std::fs::File::create(out_path.as_ref()).map_err(ReportError::Io)?;
    f.write_all(html.as_bytes()).map_err(ReportError::Io)?;
    Ok(())
}

/// Build HTML string from report data (for testing or in-memory use).
pub fn build_html(data: &ReportData) -> Result<String, ReportError> {
    // Inside <script> only `</` can end the element; entities are not decoded there.
    let json_embed = serde_json::to_string(&data.snapshot)
        .map_err(ReportError::Json)?
        .replace('<', "\\u003c");
    let snap = &data.snapshot;

    let mut protocol_cards = String::new();
    for p in &snap.protocols {
        protocol_cards.push_str(&protocol_card(p));
    }

    let mut allocation_rows = String::new();
    for p in &snap.protocols {
        let _ = writeln!(
            allocation_rows,
            "    <span class=\"label\">{name}</span><span class=\"mono\">{weight:.0}%{amount}</span>",
            name = escape_html(&p.name),
            weight = p.weight,
            amount = p
                .amount
                .map(|a| format!(" ({:.4})", a))
                .unwrap_or_default(),
        );
    }

    let realtime = snap
        .blended_realtime_apy
        .map(|x| format!("{:.2}%", x))
        .unwrap_or_else(|| "—".to_string());

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8"/>
<meta name="viewport" content="width=device-width,initial-scale=1"/>
<title>Restaking APY – {blended:.2}%</title>
<style>
:root {{ font-family: system-ui, sans-serif; background: #0f1419; color: #e6edf3; }}
body {{ max-width: 720px; margin: 0 auto; padding: 1.5rem; }}
h1 {{ font-size: 1.4rem; margin-bottom: 0.5rem; }}
h2 {{ font-size: 1.1rem; margin-top: 1.5rem; color: #8b949e; }}
h3 {{ display: flex; justify-content: space-between; margin: 0 0 0.75rem; font-size: 1rem; }}
.mono {{ font-family: ui-monospace, monospace; font-size: 0.9em; word-break: break-all; }}
.card {{ background: #161b22; border: 1px solid #30363d; border-radius: 6px; padding: 1rem; margin: 0.5rem 0; }}
.grid {{ display: grid; grid-template-columns: auto 1fr; gap: 0.25rem 1rem; }}
.label {{ color: #8b949e; }}
.bar {{ background: #30363d; border-radius: 3px; height: 6px; margin: 0.2rem 0 0.6rem; }}
.bar > div {{ background: #58a6ff; border-radius: 3px; height: 6px; }}
.footer {{ margin-top: 2rem; font-size: 0.85rem; color: #8b949e; }}
</style>
</head>
<body>
<h1>Restaking APY Report</h1>
<p>Generated: {created}</p>

<h2>Portfolio</h2>
<div class="card">
  <div class="grid">
    <span class="label">Combined APY</span><span class="mono">{blended:.2}%</span>
    <span class="label">Combined realtime APY</span><span class="mono">{realtime}</span>
{allocation_rows}  </div>
</div>

<h2>APY breakdown</h2>
{protocol_cards}
<h2>Fingerprint</h2>
<div class="card">
  <div class="mono">SHA-256: {hash}</div>
  <p class="footer">Verify with <code>restake-apy verify --snapshot &lt;file&gt;</code>.</p>
</div>

<h2>Snapshot (embedded)</h2>
<div class="card">
  <script type="application/json" id="apy-snapshot">{json_embed}</script>
</div>

<div class="footer">
  <p>APY calculations include compounding effects and are subject to change based on network conditions and validator performance. Realtime figures are simulated.</p>
</div>
</body>
</html>"#,
        blended = snap.blended_apy,
        created = escape_html(&snap.created_utc_rfc3339),
        realtime = realtime,
        allocation_rows = allocation_rows,
        protocol_cards = protocol_cards,
        hash = escape_html(&data.fingerprint_sha256),
        json_embed = json_embed,
    );
    Ok(html)
}

/// One breakdown card; bars are scaled to the largest component.
fn protocol_card(p: &ProtocolReport) -> String {
    let b = &p.breakdown;
    let max = b.max_component();
    let rows = [
        ("Base Rewards", b.base),
        ("Protocol Rewards", b.protocol),
        ("MEV Rewards", b.mev),
    ];
    let mut out = String::new();
    let _ = writeln!(out, "<div class=\"card\">");
    let _ = writeln!(
        out,
        "  <h3><span>{}</span><span>{:.2}%</span></h3>",
        escape_html(&p.name),
        b.total
    );
    for (label, value) in rows {
        let pct = if max > 0.0 {
            (value / max * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };
        let _ = writeln!(
            out,
            "  <div class=\"grid\"><span class=\"label\">{label}</span><span class=\"mono\">{value:.2}%</span></div>"
        );
        let _ = writeln!(
            out,
            "  <div class=\"bar\"><div style=\"width:{pct:.1}%\"></div></div>"
        );
    }
    if let Some(rt) = p.realtime_apy {
        let _ = writeln!(
            out,
            "  <div class=\"grid\"><span class=\"label\">Realtime</span><span class=\"mono\">{rt:.2}%</span></div>"
        );
    }
    let _ = writeln!(
        out,
        "  <p class=\"label\">Compounding: {}</p>",
        p.params.compounding_frequency
    );
    out.push_str("</div>\n");
    out
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug)]
pub enum ReportError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Io(e) => write!(f, "io: {}", e),
            ReportError::Json(e) => write!(f, "json: {}", e),
        }
    }
}

impl std::error::Error for ReportError {}

#[cfg(test)]
mod tests {
    use super::*;
    use restake_apy::{
        ids, verify_snapshot, Allocation, ApyEngine, CompoundingFrequency, ProtocolEntry,
        ProtocolRegistry, ReportSnapshot, RewardParameters,
    };

    fn data() -> ReportData {
        let engine = ApyEngine::new(ProtocolRegistry::builtin().unwrap());
        let alloc = Allocation::from_weights([(ids::EIGEN_LAYER, 60.0), (ids::STRIDE, 40.0)]).unwrap();
        ReportData::build(&engine, &alloc, None, Some(2.0)).unwrap()
    }

    #[test]
    fn build_html_contains_sections() {
        let d = data();
        let html = build_html(&d).unwrap();
        assert!(html.contains("Restaking APY Report"));
        assert!(html.contains("EigenLayer"));
        assert!(html.contains("Stride"));
        assert!(html.contains("apy-snapshot"));
        assert!(html.contains(&d.fingerprint_sha256));
        assert!(html.contains("60%"));
    }

    #[test]
    fn largest_component_bar_is_full() {
        let d = data();
        let card = protocol_card(&d.snapshot.protocols[0]);
        assert!(card.contains("width:100.0%"));
        assert!(card.contains("Compounding: daily"));
    }

    #[test]
    fn render_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.html");
        render_report(&data(), &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("<!DOCTYPE html>"));
    }

    fn embedded_json(html: &str) -> &str {
        let open = "<script type=\"application/json\" id=\"apy-snapshot\">";
        let start = html.find(open).unwrap() + open.len();
        let len = html[start..].find("</script>").unwrap();
        &html[start..start + len]
    }

    #[test]
    fn embedded_snapshot_parses_back() {
        let params = RewardParameters {
            base_rewards: 5.0,
            protocol_rewards: 1.0,
            mev_rewards: None,
            validator_effectiveness: None,
            network_participation: None,
            compounding_frequency: CompoundingFrequency::Monthly,
        };
        let registry = ProtocolRegistry::from_entries([ProtocolEntry::new(
            "odd",
            "Odd \"Vault\" </script><b>&",
            params,
        )])
        .unwrap();
        let engine = ApyEngine::new(registry);
        let d = ReportData::build(&engine, &Allocation::single("odd"), None, None).unwrap();
        let html = build_html(&d).unwrap();

        let embedded = embedded_json(&html);
        assert!(!embedded.contains("&quot;"));
        assert!(!embedded.contains('<'));
        let back: ReportSnapshot = serde_json::from_str(embedded).unwrap();
        assert_eq!(back.protocols[0].name, "Odd \"Vault\" </script><b>&");
        let check = verify_snapshot(&back, Some(d.fingerprint_sha256.as_str())).unwrap();
        assert!(check.matches);
    }

    #[test]
    fn escape() {
        assert_eq!(escape_html("<a&'\">"), "&lt;a&amp;&#39;&quot;&gt;");
    }
}
