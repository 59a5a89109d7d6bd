//! EXPLAIN output formatting
//!
//! Formats plan trees for display to users.

use std::fmt::{self, Write};

use crate::planner::node::{PlanBody, PlanNode};

/// Format a plan tree for EXPLAIN output
pub struct ExplainOutput;

impl ExplainOutput {
    /// Format a plan tree as a string, one node per line
    pub fn format(plan: &PlanNode) -> String {
        let mut output = String::new();
        // Writing into a String cannot fail
        let _ = Self::format_node(plan, 0, &mut output);
        output
    }

    fn format_node(plan: &PlanNode, indent: usize, out: &mut String) -> fmt::Result {
        let prefix = "  ".repeat(indent);

        match plan.body() {
            PlanBody::SeqScan(scan) => {
                write!(out, "{}SeqScan: table={}", prefix, scan.table_oid())?;
                if scan.is_for_update() {
                    write!(out, " for_update")?;
                }
                if scan.is_parallel() {
                    write!(out, " parallel")?;
                }
                writeln!(out)?;
                if let Some(p) = scan.predicate() {
                    writeln!(out, "{}  filter: {}", prefix, p)?;
                }
            }

            PlanBody::IndexScan(scan) => {
                writeln!(out, "{}IndexScan: index={}", prefix, scan.index_oid())?;
                if let Some(p) = scan.predicate() {
                    writeln!(out, "{}  filter: {}", prefix, p)?;
                }
            }

            PlanBody::CsvScan(csv) => {
                writeln!(
                    out,
                    "{}CsvScan: {} delimiter={:?} quote={:?} escape={:?} null={:?}",
                    prefix,
                    csv.file_name(),
                    csv.delimiter(),
                    csv.quote(),
                    csv.escape(),
                    csv.null_string()
                )?;
            }

            PlanBody::Hash(hash) => {
                let keys: Vec<_> = hash.hash_keys().iter().map(|k| k.to_string()).collect();
                writeln!(out, "{}Hash: [{}]", prefix, keys.join(", "))?;
            }

            PlanBody::Aggregate(agg) => {
                write!(out, "{}Aggregate: {:?}", prefix, agg.aggregate_strategy())?;
                if agg.is_global() {
                    write!(out, " global")?;
                }
                writeln!(out)?;
                if !agg.aggregate_terms().is_empty() {
                    let terms: Vec<_> = agg
                        .aggregate_terms()
                        .iter()
                        .map(|t| {
                            let distinct = if t.distinct { "DISTINCT " } else { "" };
                            format!("{}({}{})", t.aggregate_type.symbol(), distinct, t.expression)
                        })
                        .collect();
                    writeln!(out, "{}  aggregates: [{}]", prefix, terms.join(", "))?;
                }
                if let Some(h) = agg.having_clause_predicate() {
                    writeln!(out, "{}  having: {}", prefix, h)?;
                }
            }

            PlanBody::Insert(insert) => {
                write!(
                    out,
                    "{}Insert: table={} ({} rows",
                    prefix,
                    insert.target_table_oid(),
                    insert.values().len()
                )?;
                if insert.bulk_insert_count() > 1 {
                    write!(out, " x{}", insert.bulk_insert_count())?;
                }
                if insert.has_parameters() {
                    write!(out, ", {} parameters", insert.parameters().len())?;
                }
                writeln!(out, ")")?;
            }

            PlanBody::CreateFunction(func) => {
                let params: Vec<_> = func
                    .param_names()
                    .iter()
                    .zip(func.param_types())
                    .map(|(n, t)| format!("{} {}", n, t))
                    .collect();
                let verb = if func.is_replace() {
                    "CreateOrReplaceFunction"
                } else {
                    "CreateFunction"
                };
                writeln!(
                    out,
                    "{}{}: {}({}) RETURNS {} LANGUAGE {}",
                    prefix,
                    verb,
                    func.function_name(),
                    params.join(", "),
                    func.return_type(),
                    func.language()
                )?;
            }
        }

        if plan.is_cardinality_estimated() {
            writeln!(out, "{}  rows: {}", prefix, plan.estimated_cardinality())?;
        }

        for child in plan.children() {
            Self::format_node(child, indent + 1, out)?;
        }
        Ok(())
    }
}
