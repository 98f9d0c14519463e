//! Dense leaf storage addressed by `(family, slice, pt bin, [extrap bin])`.
//!
//! Every leaf is allocated once in [`AccumulationEngine::new`]. Each family that
//! exists gets a contiguous block in one `Vec<Hist1D>`; a block is laid out as
//! `slot -> pt bin -> extrap bin` so the offset of a leaf is plain arithmetic.

use serde::Serialize;

use crate::accum::hist::Hist1D;
use crate::accum::monitor::Monitors;
use crate::accum::profile::GaussianProfile;
use crate::binning::{BinIndex, Binning};

const CENTRAL_MAX_ETA: f64 = 1.3;
const BARREL_MAX_ETA: f64 = 2.4;
const BARREL_GAP: (f64, f64) = (1.4442, 1.5560);

const RESPONSE_AXIS: (usize, f64, f64) = (150, 0.0, 2.0);
const PT_FIRST_JET_AXIS: (usize, f64, f64) = (500, 5.0, 1005.0);
const EXTRAP_AXIS: (usize, f64, f64) = (50, 0.0, 2.0);

/// Per-event quantity deposited in a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Observable {
    Balancing,
    BalancingRaw,
    BalancingGen,
    BalancingRawGen,
    GenPhot,
    GenGamma,
    PhotGamma,
    Mpf,
    MpfRaw,
    MpfGen,
    PtFirstJet,
}

impl Observable {
    pub const ALL: [Observable; 11] = [
        Observable::Balancing,
        Observable::BalancingRaw,
        Observable::BalancingGen,
        Observable::BalancingRawGen,
        Observable::GenPhot,
        Observable::GenGamma,
        Observable::PhotGamma,
        Observable::Mpf,
        Observable::MpfRaw,
        Observable::MpfGen,
        Observable::PtFirstJet,
    ];

    /// Observables that also get a continuous-alpha profile.
    pub const PROFILED: [Observable; 4] = [
        Observable::Balancing,
        Observable::BalancingRaw,
        Observable::Mpf,
        Observable::MpfRaw,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            Observable::Balancing => "resp_balancing",
            Observable::BalancingRaw => "resp_balancing_raw",
            Observable::BalancingGen => "resp_balancing_gen",
            Observable::BalancingRawGen => "resp_balancing_raw_gen",
            Observable::GenPhot => "resp_balancing_gen_phot",
            Observable::GenGamma => "resp_balancing_gen_gamma",
            Observable::PhotGamma => "resp_balancing_phot_gamma",
            Observable::Mpf => "resp_mpf",
            Observable::MpfRaw => "resp_mpf_raw",
            Observable::MpfGen => "resp_mpf_gen",
            Observable::PtFirstJet => "ptFirstJet",
        }
    }

    /// Needs simulated-truth objects.
    pub fn is_truth(self) -> bool {
        matches!(
            self,
            Observable::BalancingGen
                | Observable::BalancingRawGen
                | Observable::GenPhot
                | Observable::GenGamma
                | Observable::PhotGamma
                | Observable::MpfGen
        )
    }

    fn ordinal(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Response(Observable),
    Extrapolation(Observable),
}

impl Family {
    fn observable(self) -> Observable {
        match self {
            Family::Response(o) | Family::Extrapolation(o) => o,
        }
    }

    fn ordinal(self) -> usize {
        match self {
            Family::Response(o) => o.ordinal(),
            Family::Extrapolation(o) => Observable::ALL.len() + o.ordinal(),
        }
    }

    fn axis(self) -> (usize, f64, f64) {
        match self {
            Family::Response(Observable::PtFirstJet) => PT_FIRST_JET_AXIS,
            Family::Response(_) => RESPONSE_AXIS,
            Family::Extrapolation(_) => EXTRAP_AXIS,
        }
    }

    /// Which slices this family is allocated on, `None` when never allocated.
    fn coverage(self, is_mc: bool) -> Option<SliceSet> {
        let obs = self.observable();
        if obs.is_truth() && !is_mc {
            return None;
        }
        use Observable::*;
        let set = match self {
            Family::Response(Balancing | Mpf) => SliceSet::ALL,
            Family::Response(BalancingRaw | MpfRaw | BalancingGen | BalancingRawGen | MpfGen) => {
                SliceSet::ETA_CENTRAL
            }
            Family::Response(PtFirstJet) => SliceSet::BARREL,
            Family::Response(GenPhot | GenGamma | PhotGamma) => return None,
            Family::Extrapolation(PtFirstJet) => return None,
            Family::Extrapolation(_) => SliceSet::ETA_CENTRAL,
        };
        Some(set)
    }
}

/// Pseudorapidity region a leaf belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slice {
    Eta(usize),
    /// `|eta| < 1.3`
    Central,
    /// `|eta| < 2.4` outside the barrel/endcap gap.
    Barrel,
}

impl Slice {
    pub fn is_central(eta: f64) -> bool {
        eta.abs() < CENTRAL_MAX_ETA
    }

    pub fn is_barrel(eta: f64) -> bool {
        let a = eta.abs();
        a < BARREL_MAX_ETA && !(BARREL_GAP.0..=BARREL_GAP.1).contains(&a)
    }
}

#[derive(Debug, Clone, Copy)]
struct SliceSet {
    eta: bool,
    central: bool,
    barrel: bool,
}

impl SliceSet {
    const ALL: SliceSet = SliceSet { eta: true, central: true, barrel: true };
    const ETA_CENTRAL: SliceSet = SliceSet { eta: true, central: true, barrel: false };
    const BARREL: SliceSet = SliceSet { eta: false, central: false, barrel: true };
}

/// Coordinates of one fill. Any `None` makes the fill a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coords {
    pub slice: Option<Slice>,
    pub pt: BinIndex,
    pub extrap: BinIndex,
}

impl Coords {
    pub fn new(slice: Slice, pt: BinIndex) -> Self {
        Self { slice: Some(slice), pt, extrap: None }
    }

    /// Pseudorapidity-bin slice; NOT_COVERED eta propagates.
    pub fn eta(eta_bin: BinIndex, pt: BinIndex) -> Self {
        Self { slice: eta_bin.map(Slice::Eta), pt, extrap: None }
    }

    pub fn with_extrap(mut self, extrap: BinIndex) -> Self {
        self.extrap = extrap;
        self
    }
}

#[derive(Debug, Clone)]
struct Block {
    base: usize,
    /// First slot of the `Eta(*)` group, of `Central`, of `Barrel`.
    eta_slot: Option<usize>,
    central_slot: Option<usize>,
    barrel_slot: Option<usize>,
    n_slots: usize,
    /// Leaves per (slot, pt bin): 1 for response, extrap bins otherwise.
    inner: usize,
}

impl Block {
    fn slot(&self, slice: Slice, n_eta: usize) -> Option<usize> {
        match slice {
            Slice::Eta(i) if i < n_eta => self.eta_slot.map(|s| s + i),
            Slice::Eta(_) => None,
            Slice::Central => self.central_slot,
            Slice::Barrel => self.barrel_slot,
        }
    }
}

/// Owns every leaf accumulator, profile and monitoring histogram of a run.
#[derive(Debug, Clone)]
pub struct AccumulationEngine {
    pt_labels: Vec<String>,
    eta_labels: Vec<String>,
    blocks: Vec<Option<Block>>,
    leaves: Vec<Hist1D>,
    profiles: Vec<GaussianProfile>,
    pub monitors: Monitors,
}

impl AccumulationEngine {
    pub fn new(binning: &Binning, is_mc: bool) -> Self {
        let n_pt = binning.pt.len();
        let n_eta = binning.eta.len();
        let n_extrap = binning.extrap.len();

        let families = Observable::ALL
            .iter()
            .map(|&o| Family::Response(o))
            .chain(Observable::ALL.iter().map(|&o| Family::Extrapolation(o)));

        let mut blocks = vec![None; 2 * Observable::ALL.len()];
        let mut leaves = Vec::new();
        for family in families {
            let Some(set) = family.coverage(is_mc) else {
                continue;
            };
            let mut n_slots = 0;
            let mut take = |present: bool, width: usize| {
                present.then(|| {
                    let s = n_slots;
                    n_slots += width;
                    s
                })
            };
            let eta_slot = take(set.eta, n_eta);
            let central_slot = take(set.central, 1);
            let barrel_slot = take(set.barrel, 1);
            let inner = match family {
                Family::Response(_) => 1,
                Family::Extrapolation(_) => n_extrap,
            };

            let block = Block {
                base: leaves.len(),
                eta_slot,
                central_slot,
                barrel_slot,
                n_slots,
                inner,
            };
            let (bins, lo, hi) = family.axis();
            leaves.extend((0..n_slots * n_pt * inner).map(|_| Hist1D::new(bins, lo, hi)));
            blocks[family.ordinal()] = Some(block);
        }

        let eta_labels: Vec<String> = (0..n_eta).map(|i| binning.eta.label(i)).collect();
        let alpha = binning.alpha.table();
        let (bins, lo, hi) = EXTRAP_AXIS;
        let profiles = Observable::PROFILED
            .iter()
            .flat_map(|obs| {
                eta_labels
                    .iter()
                    .map(String::as_str)
                    .chain(std::iter::once("eta013"))
                    .map(move |slice| format!("extrap_{}_{slice}", obs.prefix()))
            })
            .map(|name| GaussianProfile::new(name, alpha, bins, lo, hi))
            .collect();

        Self {
            pt_labels: (0..n_pt).map(|i| binning.pt.label(i)).collect(),
            eta_labels,
            blocks,
            leaves,
            profiles,
            monitors: Monitors::new(),
        }
    }

    fn offset(&self, family: Family, coords: Coords) -> Option<usize> {
        let block = self.blocks[family.ordinal()].as_ref()?;
        let slot = block.slot(coords.slice?, self.eta_labels.len())?;
        let pt = coords.pt.filter(|&p| p < self.pt_labels.len())?;
        let inner = match family {
            Family::Response(_) => 0,
            Family::Extrapolation(_) => coords.extrap.filter(|&e| e < block.inner)?,
        };
        Some(block.base + (slot * self.pt_labels.len() + pt) * block.inner + inner)
    }

    /// Deposit `value` with `weight`; false when no leaf is addressed.
    pub fn fill(&mut self, family: Family, coords: Coords, value: f64, weight: f64) -> bool {
        match self.offset(family, coords) {
            Some(i) => {
                self.leaves[i].fill(value, weight);
                true
            }
            None => false,
        }
    }

    pub fn leaf(&self, family: Family, coords: Coords) -> Option<&Hist1D> {
        self.offset(family, coords).map(|i| &self.leaves[i])
    }

    fn profile_index(&self, obs: Observable, slice: Slice) -> Option<usize> {
        let row = Observable::PROFILED.iter().position(|&o| o == obs)?;
        let n_eta = self.eta_labels.len();
        let col = match slice {
            Slice::Eta(i) if i < n_eta => i,
            Slice::Central => n_eta,
            _ => return None,
        };
        Some(row * (n_eta + 1) + col)
    }

    /// Fill the continuous-alpha profile of `obs` on `slice`.
    pub fn fill_profile(&mut self, obs: Observable, slice: Option<Slice>, alpha: f64, value: f64, weight: f64) -> bool {
        let Some(i) = slice.and_then(|s| self.profile_index(obs, s)) else {
            return false;
        };
        self.profiles[i].fill(alpha, value, weight)
    }

    pub fn profile(&self, obs: Observable, slice: Slice) -> Option<&GaussianProfile> {
        self.profile_index(obs, slice).map(|i| &self.profiles[i])
    }

    pub fn profiles(&self) -> &[GaussianProfile] {
        &self.profiles
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Sum of entries over every leaf.
    pub fn total_entries(&self) -> u64 {
        self.leaves.iter().map(|h| h.entries).sum()
    }

    fn slice_label(&self, block: &Block, slot: usize) -> &str {
        if let Some(first) = block.eta_slot
            && (first..first + self.eta_labels.len()).contains(&slot)
        {
            return &self.eta_labels[slot - first];
        }
        if block.central_slot == Some(slot) {
            "eta013"
        } else {
            "eta024"
        }
    }

    /// Every allocated leaf with its export name, in storage order.
    pub fn named_leaves(&self) -> Vec<(String, &Hist1D)> {
        let families = Observable::ALL
            .iter()
            .map(|&o| Family::Response(o))
            .chain(Observable::ALL.iter().map(|&o| Family::Extrapolation(o)));

        let mut out = Vec::with_capacity(self.leaves.len());
        for family in families {
            let Some(block) = &self.blocks[family.ordinal()] else {
                continue;
            };
            for slot in 0..block.n_slots {
                let slice = self.slice_label(block, slot);
                for (p, pt_label) in self.pt_labels.iter().enumerate() {
                    for e in 0..block.inner {
                        let i = block.base + (slot * self.pt_labels.len() + p) * block.inner + e;
                        let name = match family {
                            Family::Response(o) => format!("{}_{slice}_{pt_label}", o.prefix()),
                            Family::Extrapolation(o) => {
                                format!("extrap_{pt_label}/extrap_{}_{slice}_{e}", o.prefix())
                            }
                        };
                        out.push((name, &self.leaves[i]));
                    }
                }
            }
        }
        out
    }
}
