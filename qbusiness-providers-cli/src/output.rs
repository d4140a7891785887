use anyhow::{Context, Result};
use log::debug;
use qbusiness_providers_core::{ReconcileOutcome, TagDiff};
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::{self, Write};

pub(crate) fn note(msg: &str) {
    let _ = writeln!(io::stderr(), "qbusiness-providers: {}", msg);
}

/// Tag diff as printed by `diff-tags`
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct TagDiffOutput<'a> {
    should_update: bool,
    to_add: &'a qbusiness_providers_core::TagMap,
    to_remove: &'a BTreeSet<String>,
}

/// Reconciliation result as printed by `reconcile-tags`
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ReconcileOutput<'a> {
    resource_arn: &'a str,
    added: &'a qbusiness_providers_core::TagMap,
    removed: &'a BTreeSet<String>,
}

/// Write any serializable value as JSON to stdout
pub(crate) fn output_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    debug!("Formatting output as JSON (pretty: {})", pretty);

    let json_output = if pretty {
        serde_json::to_string_pretty(value).context("Failed to serialize output to pretty JSON")?
    } else {
        serde_json::to_string(value).context("Failed to serialize output to JSON")?
    };

    let stdout = io::stdout();
    let mut w = stdout.lock();
    writeln!(w, "{}", json_output).context("Failed to write output")?;
    Ok(())
}

pub(crate) fn output_tag_diff(diff: &TagDiff, should_update: bool, pretty: bool) -> Result<()> {
    output_json(
        &TagDiffOutput {
            should_update,
            to_add: &diff.to_add,
            to_remove: &diff.to_remove,
        },
        pretty,
    )
}

pub(crate) fn output_reconcile(
    resource_arn: &str,
    outcome: &ReconcileOutcome,
    pretty: bool,
) -> Result<()> {
    if outcome.is_noop() {
        note(&format!("tags of {} are already up to date", resource_arn));
    }
    output_json(
        &ReconcileOutput {
            resource_arn,
            added: &outcome.added,
            removed: &outcome.removed,
        },
        pretty,
    )
}
