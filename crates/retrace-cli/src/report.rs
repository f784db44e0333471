// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Table output for `list`, `inspect` and `prefs`.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use retrace_app_core::prefs::PlaybackPrefs;
use retrace_core::{Op, RunCatalog, RunFile};
use retrace_graph::Graph;

fn table(header: [&str; 2]) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    t
}

pub fn list(out: &mut impl Write, dir: &Path, catalog: &RunCatalog) -> Result<()> {
    if catalog.is_empty() {
        writeln!(out, "no runs in {}", dir.display())?;
        return Ok(());
    }
    let mut t = table(["Run", "Title"]);
    for entry in catalog.entries() {
        t.add_row(vec![entry.file.clone(), entry.name.clone()]);
    }
    writeln!(out, "{t}")?;
    Ok(())
}

pub fn inspect(out: &mut impl Write, path: &Path, run: &RunFile) -> Result<()> {
    let graph = Graph::from(run.graph.clone());
    let nested = run
        .frames
        .frames()
        .iter()
        .flatten()
        .filter(|e| e.is_frame())
        .count();

    let mut t = table(["Field", "Value"]);
    let meta = &run.meta;
    t.add_row(vec!["file".to_owned(), path.display().to_string()]);
    t.add_row(vec!["title".to_owned(), or_dash(meta.title.as_deref())]);
    t.add_row(vec!["name".to_owned(), or_dash(meta.filename.as_deref())]);
    t.add_row(vec!["style".to_owned(), or_dash(meta.style.as_deref())]);
    t.add_row(vec!["particles".to_owned(), meta.particles.to_string()]);
    t.add_row(vec!["nodes".to_owned(), graph.nodes().len().to_string()]);
    t.add_row(vec!["links".to_owned(), graph.links().len().to_string()]);
    t.add_row(vec!["frames".to_owned(), run.frames.frame_count().to_string()]);
    t.add_row(vec!["max steps".to_owned(), run.frames.total_steps().to_string()]);
    t.add_row(vec!["nested frames".to_owned(), nested.to_string()]);
    t.add_row(vec![
        "start hash".to_owned(),
        hex::encode(graph.compute_hash()?),
    ]);
    writeln!(out, "{t}")?;

    let mut histogram: BTreeMap<String, usize> = BTreeMap::new();
    let mut ignored = 0usize;
    run.frames.for_each_op(|op| {
        *histogram.entry(op.code().to_owned()).or_default() += 1;
        if matches!(op, Op::Unknown { .. } | Op::Malformed { .. }) {
            ignored += 1;
        }
    });
    let mut t = table(["Opcode", "Count"]);
    for (code, count) in &histogram {
        let code = if code.is_empty() { "(none)" } else { code };
        t.add_row(vec![code.to_owned(), count.to_string()]);
    }
    writeln!(out, "{t}")?;
    if ignored > 0 {
        writeln!(out, "{ignored} steps are unknown or malformed and replay as no-ops")?;
    }
    Ok(())
}

pub fn prefs(out: &mut impl Write, prefs: &PlaybackPrefs, location: &str) -> Result<()> {
    let mut t = table(["Pref", "Value"]);
    t.add_row(vec!["speed_ms".to_owned(), prefs.speed_ms.to_string()]);
    t.add_row(vec![
        "initial_delay_ms".to_owned(),
        prefs.initial_delay_ms.to_string(),
    ]);
    t.add_row(vec!["stepwise".to_owned(), prefs.stepwise.to_string()]);
    t.add_row(vec![
        "run_dir".to_owned(),
        prefs
            .run_dir
            .as_ref()
            .map_or_else(|| "-".to_owned(), |d| d.display().to_string()),
    ]);
    writeln!(out, "{t}")?;
    writeln!(out, "stored at {location}")?;
    Ok(())
}

fn or_dash(v: Option<&str>) -> String {
    v.unwrap_or("-").to_owned()
}
