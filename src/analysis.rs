//! # Analysis Configurations
//!
//! The two physics analyses are values, not code: each names its columns,
//! its cut thresholds and its histogram binning, and builds a [`Pipeline`]
//! from them.
//!
//! Both load from TOML; unset fields keep their defaults:
//!
//! ```toml
//! kind = "three-body"
//! kaon_prob_min = 0.6
//!
//! [histogram]
//! name = "B_mass"
//! bins = 250
//! lo = 5050.0
//! hi = 5500.0
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::histogram::Binning;
use crate::kinematics::KAON_MASS_MEV;
use crate::pipeline::{CmpOp, Derived, Pipeline, PipelineError, Stage};
use crate::schema::{ColumnSpec, ElementType};

/// Which analysis to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisKind {
    /// Opposite-sign muon pairs
    #[default]
    Dimuon,
    /// Three-kaon B candidates
    ThreeBody,
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisKind::Dimuon => write!(f, "dimuon"),
            AnalysisKind::ThreeBody => write!(f, "three-body"),
        }
    }
}

/// Dimuon invariant mass of events with exactly two opposite-sign muons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimuonConfig {
    /// Tree holding the events in native files
    pub tree: String,
    /// Muon multiplicity column
    pub count: String,
    /// Muon charge list column
    pub charge: String,
    /// Muon transverse momentum list column
    pub pt: String,
    /// Muon pseudorapidity list column
    pub eta: String,
    /// Muon azimuth list column
    pub phi: String,
    /// Muon mass list column
    pub mass: String,
    /// Required number of muons
    pub muons: usize,
    /// Name of the mass slot
    pub slot: String,
    /// Mass histogram
    pub histogram: Binning,
}

impl Default for DimuonConfig {
    fn default() -> Self {
        Self {
            tree: "Events".to_string(),
            count: "nMuon".to_string(),
            charge: "Muon_charge".to_string(),
            pt: "Muon_pt".to_string(),
            eta: "Muon_eta".to_string(),
            phi: "Muon_phi".to_string(),
            mass: "Muon_mass".to_string(),
            muons: 2,
            slot: "Dimuon_mass".to_string(),
            histogram: Binning::new("Dimuon_mass", 2000, 0.25, 300.0),
        }
    }
}

impl DimuonConfig {
    fn columns(&self) -> Vec<ColumnSpec> {
        vec![
            ColumnSpec::scalar(&self.count, ElementType::Int32),
            ColumnSpec::list(&self.charge, ElementType::Int32),
            ColumnSpec::list(&self.pt, ElementType::Float32),
            ColumnSpec::list(&self.eta, ElementType::Float32),
            ColumnSpec::list(&self.phi, ElementType::Float32),
            ColumnSpec::list(&self.mass, ElementType::Float32),
        ]
    }

    fn stages(&self) -> Vec<Stage> {
        vec![
            Stage::cut(&self.count, CmpOp::Eq, self.muons as f64),
            Stage::OppositeCharge {
                column: self.charge.clone(),
            },
            Stage::Define {
                slot: self.slot.clone(),
                derived: Derived::PtEtaPhiMass {
                    pt: self.pt.clone(),
                    eta: self.eta.clone(),
                    phi: self.phi.clone(),
                    mass: self.mass.clone(),
                    arity: self.muons,
                },
            },
        ]
    }
}

/// Three-body invariant mass of candidates whose tracks all look like kaons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreeBodyConfig {
    /// Tree holding the candidates in native files
    pub tree: String,
    /// Track column prefixes
    pub tracks: Vec<String>,
    /// Kaon probability each track must exceed
    pub kaon_prob_min: f64,
    /// Pion probability each track must stay below
    pub pion_prob_max: f64,
    /// Mass assigned to every track
    pub kaon_mass: f64,
    /// Name of the mass slot
    pub slot: String,
    /// Mass histogram
    pub histogram: Binning,
}

impl Default for ThreeBodyConfig {
    fn default() -> Self {
        Self {
            tree: "DecayTree".to_string(),
            tracks: vec!["H1".to_string(), "H2".to_string(), "H3".to_string()],
            kaon_prob_min: 0.5,
            pion_prob_max: 0.5,
            kaon_mass: KAON_MASS_MEV,
            slot: "B_m".to_string(),
            histogram: Binning::new("B_mass", 500, 5050.0, 5500.0),
        }
    }
}

impl ThreeBodyConfig {
    fn track_columns(&self, suffix: &str) -> Vec<String> {
        self.tracks.iter().map(|t| format!("{t}_{suffix}")).collect()
    }

    fn columns(&self) -> Vec<ColumnSpec> {
        let mut columns = Vec::with_capacity(self.tracks.len() * 6);
        for track in &self.tracks {
            columns.push(ColumnSpec::scalar(format!("{track}_isMuon"), ElementType::Int32));
            for suffix in ["ProbK", "ProbPi", "PX", "PY", "PZ"] {
                columns.push(ColumnSpec::scalar(format!("{track}_{suffix}"), ElementType::Float64));
            }
        }
        columns
    }

    fn stages(&self) -> Vec<Stage> {
        let mut stages = Vec::with_capacity(self.tracks.len() * 3 + 1);
        stages.extend(
            self.track_columns("isMuon")
                .into_iter()
                .map(|c| Stage::cut(c, CmpOp::Eq, 0.0)),
        );
        stages.extend(
            self.track_columns("ProbK")
                .into_iter()
                .map(|c| Stage::cut(c, CmpOp::Gt, self.kaon_prob_min)),
        );
        stages.extend(
            self.track_columns("ProbPi")
                .into_iter()
                .map(|c| Stage::cut(c, CmpOp::Lt, self.pion_prob_max)),
        );
        stages.push(Stage::Define {
            slot: self.slot.clone(),
            derived: Derived::CartesianFixedMass {
                px: self.track_columns("PX"),
                py: self.track_columns("PY"),
                pz: self.track_columns("PZ"),
                mass: self.kaon_mass,
            },
        });
        stages
    }
}

/// One analysis, fully configured
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AnalysisConfig {
    /// Dimuon analysis
    Dimuon(DimuonConfig),
    /// Three-body analysis
    ThreeBody(ThreeBodyConfig),
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::for_kind(AnalysisKind::default())
    }
}

impl AnalysisConfig {
    /// Default configuration of `kind`
    pub fn for_kind(kind: AnalysisKind) -> Self {
        match kind {
            AnalysisKind::Dimuon => Self::Dimuon(DimuonConfig::default()),
            AnalysisKind::ThreeBody => Self::ThreeBody(ThreeBodyConfig::default()),
        }
    }

    /// Parse from a TOML document
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Which analysis this is
    pub fn kind(&self) -> AnalysisKind {
        match self {
            Self::Dimuon(_) => AnalysisKind::Dimuon,
            Self::ThreeBody(_) => AnalysisKind::ThreeBody,
        }
    }

    /// Tree name in native files
    pub fn tree(&self) -> &str {
        match self {
            Self::Dimuon(c) => &c.tree,
            Self::ThreeBody(c) => &c.tree,
        }
    }

    /// Columns the analysis reads, with their declared types
    pub fn columns(&self) -> Vec<ColumnSpec> {
        match self {
            Self::Dimuon(c) => c.columns(),
            Self::ThreeBody(c) => c.columns(),
        }
    }

    /// Stage list, in evaluation order
    pub fn stages(&self) -> Vec<Stage> {
        match self {
            Self::Dimuon(c) => c.stages(),
            Self::ThreeBody(c) => c.stages(),
        }
    }

    /// Slot the histogram is filled from
    pub fn fill_slot(&self) -> &str {
        match self {
            Self::Dimuon(c) => &c.slot,
            Self::ThreeBody(c) => &c.slot,
        }
    }

    /// Histogram binning
    pub fn binning(&self) -> &Binning {
        match self {
            Self::Dimuon(c) => &c.histogram,
            Self::ThreeBody(c) => &c.histogram,
        }
    }

    /// Compile the analysis
    pub fn pipeline(&self) -> Result<Pipeline, PipelineError> {
        Pipeline::new(
            self.columns(),
            self.stages(),
            self.fill_slot(),
            self.binning().clone(),
        )
    }
}
