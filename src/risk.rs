//! Risk analysis: a baseline check refined by standardness
//!
//! The baseline check runs first and any non-OK finding it makes is final.
//! Only an OK baseline is refined by evaluating the target transaction and
//! then each of its dependencies for standardness.

use crate::evaluator::{StandardnessCheck, StandardnessEvaluator, Violation};
use crate::structure::NonStandardReason;
use crate::transaction::{calculate_tx_id, tx_id_hex};
use crate::types::*;
use std::fmt;
use tracing::debug;

/// Generic risk check consulted before standardness
pub trait BaselineRiskCheck {
    fn check(&self, tx: &Transaction, dependencies: &[&Transaction]) -> RiskResult;

    /// Human-readable status for a non-OK `result`
    fn describe(&self, tx: &Transaction, result: RiskResult) -> String {
        format!("Risky due to {} status of {}", result, tx_id_hex(tx))
    }
}

/// Baseline that never objects
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissiveBaseline;

impl BaselineRiskCheck for PermissiveBaseline {
    fn check(&self, _tx: &Transaction, _dependencies: &[&Transaction]) -> RiskResult {
        RiskResult::Ok
    }
}

/// Pending analysis of one transaction and its dependencies
///
/// Dependencies may be any borrowed collection of transactions, such as a
/// slice of owned transactions or the output of
/// [`TransactionPool::dependencies_of`](crate::pool::TransactionPool::dependencies_of).
pub struct RiskAnalyzer<'a, B, S = StandardnessEvaluator> {
    tx: &'a Transaction,
    dependencies: Vec<&'a Transaction>,
    baseline: B,
    standardness: S,
}

impl<'a, B: BaselineRiskCheck> RiskAnalyzer<'a, B> {
    pub fn new<D>(tx: &'a Transaction, dependencies: D, baseline: B) -> Self
    where
        D: IntoIterator<Item = &'a Transaction>,
    {
        Self::with_standardness(tx, dependencies, baseline, StandardnessEvaluator::default())
    }
}

impl<'a, B: BaselineRiskCheck, S: StandardnessCheck> RiskAnalyzer<'a, B, S> {
    pub fn with_standardness<D>(tx: &'a Transaction, dependencies: D, baseline: B, standardness: S) -> Self
    where
        D: IntoIterator<Item = &'a Transaction>,
    {
        Self {
            tx,
            dependencies: dependencies.into_iter().collect(),
            baseline,
            standardness,
        }
    }

    /// Analyze: 𝒯𝒳 × 𝒯𝒳* → {OK, NON_STANDARD} ∪ baseline results
    ///
    /// 1. Non-OK baseline result: adopt it and stop
    /// 2. Index dependencies by transaction id
    /// 3. Target non-standard: NON_STANDARD
    /// 4. Any dependency non-standard: NON_STANDARD
    /// 5. Otherwise OK
    ///
    /// Consumes the analyzer, so each instance is analyzed exactly once.
    pub fn analyze(self) -> RiskAnalysis<'a> {
        let tx = self.tx;
        let dependencies = self.dependencies;

        let baseline_result = self.baseline.check(tx, &dependencies);
        if baseline_result != RiskResult::Ok {
            debug!(tx = %tx_id_hex(tx), result = %baseline_result, "baseline check found risk");
            return RiskAnalysis {
                tx,
                result: baseline_result,
                outcome: Outcome::BaselineRisky {
                    description: self.baseline.describe(tx, baseline_result),
                },
            };
        }

        let dependency_map: DependencyMap<'a> = dependencies
            .iter()
            .map(|dep| (calculate_tx_id(dep), *dep))
            .collect();

        let violation = self.standardness.check(tx, &dependency_map).or_else(|| {
            dependencies
                .iter()
                .find_map(|dep| self.standardness.check(*dep, &dependency_map))
        });

        match violation {
            Some(violation) => RiskAnalysis {
                tx,
                result: RiskResult::NonStandard,
                outcome: Outcome::NonStandard(violation),
            },
            None => RiskAnalysis {
                tx,
                result: RiskResult::Ok,
                outcome: Outcome::Standard,
            },
        }
    }
}

impl<B, S> fmt::Display for RiskAnalyzer<'_, B, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pending risk analysis for {}", tx_id_hex(self.tx))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome<'a> {
    BaselineRisky { description: String },
    Standard,
    NonStandard(Violation<'a>),
}

/// Completed, immutable analysis result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskAnalysis<'a> {
    tx: &'a Transaction,
    result: RiskResult,
    outcome: Outcome<'a>,
}

impl<'a> RiskAnalysis<'a> {
    pub fn result(&self) -> RiskResult {
        self.result
    }

    /// The analyzed target transaction
    pub fn transaction(&self) -> &'a Transaction {
        self.tx
    }

    /// First transaction found non-standard (target or a dependency)
    pub fn non_standard(&self) -> Option<&'a Transaction> {
        match &self.outcome {
            Outcome::NonStandard(violation) => Some(violation.offender),
            _ => None,
        }
    }

    /// Rule the offending transaction broke
    pub fn reason(&self) -> Option<&NonStandardReason> {
        match &self.outcome {
            Outcome::NonStandard(violation) => Some(&violation.reason),
            _ => None,
        }
    }

    /// Whether the baseline check decided the result
    pub fn is_baseline_risky(&self) -> bool {
        matches!(self.outcome, Outcome::BaselineRisky { .. })
    }
}

impl fmt::Display for RiskAnalysis<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Outcome::BaselineRisky { description } => write!(f, "{}", description),
            Outcome::NonStandard(violation) => write!(
                f,
                "Risky due to non-standardness of {}",
                tx_id_hex(violation.offender)
            ),
            Outcome::Standard => write!(f, "Non-risky"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::*;
    use std::cell::Cell;

    struct FixedBaseline(RiskResult);

    impl BaselineRiskCheck for FixedBaseline {
        fn check(&self, _tx: &Transaction, _dependencies: &[&Transaction]) -> RiskResult {
            self.0
        }
    }

    /// Counts how often it is consulted and never objects
    #[derive(Default)]
    struct CountingStandardness {
        calls: Cell<usize>,
    }

    impl StandardnessCheck for &CountingStandardness {
        fn check<'a>(
            &self,
            _tx: &'a Transaction,
            _dependencies: &DependencyMap<'a>,
        ) -> Option<Violation<'a>> {
            self.calls.set(self.calls.get() + 1);
            None
        }
    }

    #[test]
    fn test_analyze_standard() {
        let parent = create_transaction([9; 32], vec![], p2pkh_script(&[1; 20]));
        let child = create_transaction(calculate_tx_id(&parent), create_sig(2), p2pkh_script(&[2; 20]));
        let deps = vec![parent];

        let analysis = RiskAnalyzer::new(&child, &deps, PermissiveBaseline).analyze();
        assert_eq!(analysis.result(), RiskResult::Ok);
        assert!(analysis.non_standard().is_none());
        assert_eq!(analysis.to_string(), "Non-risky");
    }

    #[test]
    fn test_analyze_non_standard_target() {
        let mut tx = create_transaction([9; 32], create_sig(2), p2pkh_script(&[2; 20]));
        tx.version = 2;
        let analysis = RiskAnalyzer::new(&tx, &[], PermissiveBaseline).analyze();

        assert_eq!(analysis.result(), RiskResult::NonStandard);
        assert!(std::ptr::eq(analysis.non_standard().unwrap(), &tx));
        assert_eq!(analysis.reason(), Some(&NonStandardReason::Version(2)));
        assert_eq!(
            analysis.to_string(),
            format!("Risky due to non-standardness of {}", tx_id_hex(&tx))
        );
    }

    #[test]
    fn test_analyze_non_standard_dependency() {
        // Dependency pays to a dust output; the target spends an unrelated coin
        let dep = create_transaction([7; 32], vec![], p2pkh_script(&[1; 20]));
        let mut dusty = dep.clone();
        dusty.outputs[0].value = 1;
        let target = create_transaction([8; 32], create_sig(2), p2pkh_script(&[2; 20]));
        let deps = vec![dusty];

        let analysis = RiskAnalyzer::new(&target, &deps, PermissiveBaseline).analyze();
        assert_eq!(analysis.result(), RiskResult::NonStandard);
        assert!(std::ptr::eq(analysis.non_standard().unwrap(), &deps[0]));
    }

    #[test]
    fn test_baseline_precedence() {
        let mut tx = create_transaction([9; 32], create_sig(2), p2pkh_script(&[2; 20]));
        tx.version = 2;
        let standardness = CountingStandardness::default();

        let analysis = RiskAnalyzer::with_standardness(
            &tx,
            &[],
            FixedBaseline(RiskResult::NonFinal),
            &standardness,
        )
        .analyze();

        assert_eq!(analysis.result(), RiskResult::NonFinal);
        assert!(analysis.is_baseline_risky());
        assert!(analysis.non_standard().is_none());
        assert_eq!(standardness.calls.get(), 0);
        assert_eq!(
            analysis.to_string(),
            format!("Risky due to NON_FINAL status of {}", tx_id_hex(&tx))
        );
    }

    #[test]
    fn test_standardness_runs_over_target_and_each_dependency() {
        let tx = create_transaction([9; 32], create_sig(2), p2pkh_script(&[2; 20]));
        let deps = vec![
            create_transaction([1; 32], vec![], p2pkh_script(&[1; 20])),
            create_transaction([2; 32], vec![], p2pkh_script(&[1; 20])),
        ];
        let standardness = CountingStandardness::default();

        let analysis =
            RiskAnalyzer::with_standardness(&tx, &deps, PermissiveBaseline, &standardness).analyze();

        assert_eq!(analysis.result(), RiskResult::Ok);
        assert_eq!(standardness.calls.get(), 3);
    }

    #[test]
    fn test_pending_display() {
        let tx = create_transaction([9; 32], vec![], p2pkh_script(&[2; 20]));
        let analyzer = RiskAnalyzer::new(&tx, &[], PermissiveBaseline);
        assert_eq!(
            analyzer.to_string(),
            format!("Pending risk analysis for {}", tx_id_hex(&tx))
        );
    }

    fn create_transaction(prev_hash: Hash, script_sig: ByteString, script_pubkey: ByteString) -> Transaction {
        Transaction {
            version: 1,
            inputs: vec![TransactionInput {
                prevout: OutPoint { hash: prev_hash, index: 0 },
                script_sig,
                sequence: 0xffffffff,
            }],
            outputs: vec![TransactionOutput {
                value: 100_000,
                script_pubkey,
            }],
            lock_time: 0,
        }
    }

    fn create_sig(elements: usize) -> ByteString {
        let mut sig = Vec::new();
        for _ in 0..elements {
            push_data(&mut sig, &[0x30; 33]);
        }
        sig
    }
}
