use std::fmt;

use serde::{Deserialize, Serialize};

use crate::kinematics::{invariant_mass_fixed, invariant_mass_pt_eta_phi_m};
use crate::reader::ReaderError;
use crate::schema::{ColumnKind, ColumnSpec, ElementType};
use crate::view::Entry;

use super::PipelineError;

/// Comparison applied by a [`Stage::Cut`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CmpOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl CmpOp {
    /// Apply `value <op> threshold`
    #[inline]
    pub fn apply(self, value: f64, threshold: f64) -> bool {
        match self {
            CmpOp::Eq => value == threshold,
            CmpOp::Ne => value != threshold,
            CmpOp::Lt => value < threshold,
            CmpOp::Le => value <= threshold,
            CmpOp::Gt => value > threshold,
            CmpOp::Ge => value >= threshold,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }
}

/// A derived per-entry quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Derived {
    /// Invariant mass of `arity` particles from pt/eta/phi/mass list columns
    PtEtaPhiMass {
        /// Transverse momentum list
        pt: String,
        /// Pseudorapidity list
        eta: String,
        /// Azimuth list
        phi: String,
        /// Mass list
        mass: String,
        /// Required number of particles
        arity: usize,
    },
    /// Invariant mass of tracks given as scalar momentum columns, one per
    /// track, each assigned the same fixed mass
    CartesianFixedMass {
        /// x momentum columns
        px: Vec<String>,
        /// y momentum columns
        py: Vec<String>,
        /// z momentum columns
        pz: Vec<String>,
        /// Assumed mass per track
        mass: f64,
    },
}

impl Derived {
    /// Columns read by this quantity
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Derived::PtEtaPhiMass {
                pt, eta, phi, mass, ..
            } => vec![pt.as_str(), eta.as_str(), phi.as_str(), mass.as_str()],
            Derived::CartesianFixedMass { px, py, pz, .. } => {
                px.iter().chain(py).chain(pz).map(String::as_str).collect()
            }
        }
    }
}

/// One step of an analysis chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Stage {
    /// Keep entries whose scalar `column` satisfies `op threshold`
    Cut {
        /// Scalar column
        column: String,
        /// Comparison
        op: CmpOp,
        /// Right-hand side
        threshold: f64,
    },
    /// Keep entries whose two-element integer list holds differing values
    OppositeCharge {
        /// Charge list column
        column: String,
    },
    /// Compute `derived` into the named slot
    Define {
        /// Slot name
        slot: String,
        /// Quantity to compute
        derived: Derived,
    },
}

impl Stage {
    /// Scalar cut
    pub fn cut(column: impl Into<String>, op: CmpOp, threshold: f64) -> Self {
        Stage::Cut {
            column: column.into(),
            op,
            threshold,
        }
    }

    /// Columns read by this stage
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Stage::Cut { column, .. } | Stage::OppositeCharge { column } => vec![column.as_str()],
            Stage::Define { derived, .. } => derived.columns(),
        }
    }

    /// Whether the stage filters rather than defines
    pub fn is_filter(&self) -> bool {
        !matches!(self, Stage::Define { .. })
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Cut {
                column,
                op,
                threshold,
            } => write!(f, "{} {} {}", column, op.symbol(), threshold),
            Stage::OppositeCharge { column } => write!(f, "{}[0] != {}[1]", column, column),
            Stage::Define { slot, derived } => match derived {
                Derived::PtEtaPhiMass { arity, .. } => {
                    write!(f, "{} = mass of {} (pt, eta, phi, m)", slot, arity)
                }
                Derived::CartesianFixedMass { px, mass, .. } => {
                    write!(f, "{} = mass of {} (px, py, pz) at m = {}", slot, px.len(), mass)
                }
            },
        }
    }
}

/// Outcome of one stage on one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Entry continues down the chain
    Pass,
    /// Entry rejected by the stage
    Reject,
    /// Entry has a list of the wrong length; skipped
    Malformed,
}

/// A stage with its columns resolved to positions in the bound column list
#[derive(Debug, Clone)]
pub(crate) enum Step {
    Cut {
        column: usize,
        op: CmpOp,
        threshold: f64,
    },
    OppositeCharge {
        column: usize,
    },
    PtEtaPhiMass {
        slot: usize,
        pt: usize,
        eta: usize,
        phi: usize,
        mass: usize,
        arity: usize,
    },
    CartesianFixedMass {
        slot: usize,
        px: Vec<usize>,
        py: Vec<usize>,
        pz: Vec<usize>,
        mass: f64,
    },
}

/// Reusable buffers for list columns widened to f64
#[derive(Debug, Default)]
pub(crate) struct Scratch {
    pt: Vec<f64>,
    eta: Vec<f64>,
    phi: Vec<f64>,
    mass: Vec<f64>,
    px: Vec<f64>,
    py: Vec<f64>,
    pz: Vec<f64>,
}

fn locate(columns: &[ColumnSpec], name: &str) -> Result<usize, PipelineError> {
    columns
        .iter()
        .position(|c| c.name == name)
        .ok_or_else(|| PipelineError::UndeclaredColumn(name.to_string()))
}

fn locate_kind(
    columns: &[ColumnSpec],
    name: &str,
    accepts: impl Fn(ColumnKind) -> bool,
    expected: &str,
) -> Result<usize, PipelineError> {
    let idx = locate(columns, name)?;
    if accepts(columns[idx].kind) {
        Ok(idx)
    } else {
        Err(PipelineError::ColumnKind {
            column: name.to_string(),
            expected: expected.to_string(),
            found: columns[idx].to_string(),
        })
    }
}

fn scalar(kind: ColumnKind) -> bool {
    matches!(kind, ColumnKind::Scalar(_))
}

fn int_list(kind: ColumnKind) -> bool {
    kind == ColumnKind::List(ElementType::Int32)
}

fn float_list(kind: ColumnKind) -> bool {
    matches!(
        kind,
        ColumnKind::List(ElementType::Float32) | ColumnKind::List(ElementType::Float64)
    )
}

/// Read one scalar per column of `columns` into `out`
#[inline]
fn gather_scalars(
    entry: &Entry<'_, '_>,
    columns: &[usize],
    out: &mut Vec<f64>,
) -> Result<(), ReaderError> {
    out.clear();
    for &column in columns {
        out.push(entry.scalar(column)?);
    }
    Ok(())
}

impl Step {
    /// Resolve `stage` against the declared columns and the slots defined so far
    pub(crate) fn compile(
        stage: &Stage,
        columns: &[ColumnSpec],
        slots: &mut Vec<String>,
    ) -> Result<Self, PipelineError> {
        match stage {
            Stage::Cut {
                column,
                op,
                threshold,
            } => Ok(Step::Cut {
                column: locate_kind(columns, column, scalar, "scalar")?,
                op: *op,
                threshold: *threshold,
            }),
            Stage::OppositeCharge { column } => Ok(Step::OppositeCharge {
                column: locate_kind(columns, column, int_list, "list<int32>")?,
            }),
            Stage::Define { slot, derived } => {
                if slots.iter().any(|s| s == slot) {
                    return Err(PipelineError::DuplicateSlot(slot.clone()));
                }
                let step = match derived {
                    Derived::PtEtaPhiMass {
                        pt,
                        eta,
                        phi,
                        mass,
                        arity,
                    } => {
                        let list = |name: &str| locate_kind(columns, name, float_list, "list<float>");
                        Step::PtEtaPhiMass {
                            slot: slots.len(),
                            pt: list(pt)?,
                            eta: list(eta)?,
                            phi: list(phi)?,
                            mass: list(mass)?,
                            arity: *arity,
                        }
                    }
                    Derived::CartesianFixedMass { px, py, pz, mass } => {
                        if px.len() != py.len() || px.len() != pz.len() {
                            return Err(PipelineError::TrackMismatch {
                                slot: slot.clone(),
                                px: px.len(),
                                py: py.len(),
                                pz: pz.len(),
                            });
                        }
                        let resolve = |names: &[String]| {
                            names
                                .iter()
                                .map(|n| locate_kind(columns, n, scalar, "scalar"))
                                .collect::<Result<Vec<_>, _>>()
                        };
                        Step::CartesianFixedMass {
                            slot: slots.len(),
                            px: resolve(px)?,
                            py: resolve(py)?,
                            pz: resolve(pz)?,
                            mass: *mass,
                        }
                    }
                };
                slots.push(slot.clone());
                Ok(step)
            }
        }
    }

    /// Evaluate on one entry, writing any defined value into `slots`.
    ///
    /// Arity mismatches become [`Verdict::Malformed`]; every other read
    /// failure is returned as an error.
    #[inline]
    pub(crate) fn eval(
        &self,
        entry: &Entry<'_, '_>,
        slots: &mut [f64],
        scratch: &mut Scratch,
    ) -> Result<Verdict, ReaderError> {
        match self.eval_inner(entry, slots, scratch) {
            Ok(verdict) => Ok(verdict),
            Err(err) if err.is_entry_local() => Ok(Verdict::Malformed),
            Err(err) => Err(err),
        }
    }

    fn eval_inner(
        &self,
        entry: &Entry<'_, '_>,
        slots: &mut [f64],
        scratch: &mut Scratch,
    ) -> Result<Verdict, ReaderError> {
        let verdict = |keep: bool| if keep { Verdict::Pass } else { Verdict::Reject };
        match self {
            Step::Cut {
                column,
                op,
                threshold,
            } => Ok(verdict(op.apply(entry.scalar(*column)?, *threshold))),
            Step::OppositeCharge { column } => {
                let charges = entry.int_list(*column, 2)?;
                Ok(verdict(charges[0] != charges[1]))
            }
            Step::PtEtaPhiMass {
                slot,
                pt,
                eta,
                phi,
                mass,
                arity,
            } => {
                entry.float_list_into(*pt, *arity, &mut scratch.pt)?;
                entry.float_list_into(*eta, *arity, &mut scratch.eta)?;
                entry.float_list_into(*phi, *arity, &mut scratch.phi)?;
                entry.float_list_into(*mass, *arity, &mut scratch.mass)?;
                slots[*slot] = invariant_mass_pt_eta_phi_m(
                    &scratch.pt,
                    &scratch.eta,
                    &scratch.phi,
                    &scratch.mass,
                );
                Ok(Verdict::Pass)
            }
            Step::CartesianFixedMass {
                slot,
                px,
                py,
                pz,
                mass,
            } => {
                gather_scalars(entry, px, &mut scratch.px)?;
                gather_scalars(entry, py, &mut scratch.py)?;
                gather_scalars(entry, pz, &mut scratch.pz)?;
                slots[*slot] = invariant_mass_fixed(&scratch.px, &scratch.py, &scratch.pz, *mass);
                Ok(Verdict::Pass)
            }
        }
    }
}
