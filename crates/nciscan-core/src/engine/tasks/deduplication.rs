use crate::core::models::interaction::{InteractionRecord, is_dipole_label};
use crate::core::params::priority::PriorityTable;
use crate::engine::context::DetectionContext;
use crate::engine::error::EngineError;
use crate::engine::table::InteractionTable;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, instrument};

/// Indices of records sharing a key, grouped in order of first appearance.
fn group_by<K: std::hash::Hash + Eq>(keys: impl Iterator<Item = (usize, K)>) -> Vec<Vec<usize>> {
    let mut slots: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (i, key) in keys {
        let slot = *slots.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(i);
    }
    groups
}

fn distinct_labels<'r>(labels: impl Iterator<Item = &'r str>) -> Vec<String> {
    labels
        .filter(|label| !is_dipole_label(label))
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

struct Scored {
    primary: Option<i64>,
    secondary: Option<i64>,
}

fn element<'a>(ctx: &DetectionContext<'a>, serial: usize) -> Result<&'a str, EngineError> {
    Ok(ctx.atom(ctx.atom_id(serial)?)?.element())
}

fn score(
    ctx: &DetectionContext,
    priorities: &PriorityTable,
    record: &InteractionRecord,
) -> Result<Scored, EngineError> {
    let primary = priorities.score(&record.label, element(ctx, record.atom1)?, element(ctx, record.atom2)?);
    let secondary = match &record.bridge {
        Some(leg) => priorities.score(&leg.label, element(ctx, leg.solvent)?, element(ctx, leg.partner)?),
        None => None,
    };
    Ok(Scored { primary, secondary })
}

/// Resolves families competing for the same atom pair by priority.
///
/// Records alone on their pair and dipole records always survive. In a contested
/// group the records with the highest score survive; a group where no family has
/// a score is only accepted when it holds a single family. Bridged records are
/// then resolved the same way on their second leg.
#[instrument(skip_all, name = "deduplication_task")]
pub fn run(ctx: &DetectionContext, table: &mut InteractionTable) -> Result<(), EngineError> {
    if table.is_empty() {
        return Ok(());
    }
    let priorities = ctx.priorities.ok_or(EngineError::MissingPriorityTable)?;
    let records = table.records();
    let before = records.len();
    let scores = records
        .iter()
        .map(|record| score(ctx, priorities, record))
        .collect::<Result<Vec<_>, _>>()?;

    // === Primary legs ===
    let mut keep = vec![false; records.len()];
    for group in group_by(records.iter().enumerate().map(|(i, r)| (i, r.pair_key()))) {
        if let [only] = group.as_slice() {
            keep[*only] = true;
            continue;
        }
        for &i in &group {
            keep[i] = records[i].is_dipole();
        }
        if group.iter().all(|&i| keep[i]) {
            continue;
        }
        match group.iter().filter_map(|&i| scores[i].primary).max() {
            Some(best) => {
                for &i in &group {
                    if scores[i].primary == Some(best) {
                        keep[i] = true;
                    }
                }
            }
            None => {
                let labels = distinct_labels(group.iter().map(|&i| records[i].label.as_str()));
                if labels.len() > 1 {
                    let first = &records[group[0]];
                    return Err(EngineError::UnresolvedPriority {
                        labels,
                        atom1: first.atom1,
                        atom2: first.atom2,
                    });
                }
                for &i in &group {
                    keep[i] = true;
                }
            }
        }
    }

    // === Secondary legs ===
    let bridged = records.iter().enumerate().filter_map(|(i, r)| {
        let leg = r.bridge.as_ref()?;
        keep[i].then_some((i, (r.atom1, r.atom2, leg.solvent, leg.partner)))
    });
    for group in group_by(bridged) {
        if group.len() < 2 {
            continue;
        }
        let leg_label = |i: usize| records[i].label2().unwrap_or_default();
        match group.iter().filter_map(|&i| scores[i].secondary).max() {
            Some(best) => {
                for &i in &group {
                    if scores[i].secondary != Some(best) && !is_dipole_label(leg_label(i)) {
                        keep[i] = false;
                    }
                }
            }
            None => {
                let labels = distinct_labels(group.iter().map(|&i| leg_label(i)));
                if labels.len() > 1 {
                    let first = &records[group[0]];
                    return Err(EngineError::UnresolvedPriority {
                        labels,
                        atom1: first.atom3().unwrap_or_default(),
                        atom2: first.atom4().unwrap_or_default(),
                    });
                }
            }
        }
    }

    let dropped = keep.iter().filter(|&&k| !k).count();
    debug!(dropped, "Resolved overlapping families.");
    let mut flags = keep.into_iter();
    table.retain(|_| flags.next().unwrap_or(true));
    info!(before, after = table.len(), "Removed duplicate records.");
    Ok(())
}
