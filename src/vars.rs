//! Variable-name introspection over unit and synapse state.
//!
//! Each layer exposes the generic unit variables followed by those of its
//! role; each projection exposes the generic synapse variables followed by
//! the trace variables when it learns by trace. Indices are positions in the
//! layer's (or projection's) name list and are stable after build.

use crate::error::{GateError, Result};
use crate::layer::{Layer, LayerKind};
use crate::prjn::{PrjnKind, Projection};

pub const UNIT_VARS: &[&str] = &["Act", "Ext", "Ge", "GeRaw", "ActLrn", "AlphaMax", "PVAct"];
pub const PFC_UNIT_VARS: &[&str] = &["ActG", "Maint", "MaintGe"];
/// Layer-level values, reported identically for every unit.
pub const MATRIX_UNIT_VARS: &[&str] = &["DA", "DALrn", "ACh"];

pub const SYN_VARS: &[&str] = &["Wt", "DWt", "Norm", "Moment"];
pub const TRACE_SYN_VARS: &[&str] = &["NTr", "Tr"];

impl Layer {
    fn role_unit_vars(&self) -> &'static [&'static str] {
        match self.kind {
            LayerKind::PfcDeep(_) => PFC_UNIT_VARS,
            LayerKind::Matrix(_) => MATRIX_UNIT_VARS,
            LayerKind::Plain | LayerKind::Pv(_) => &[],
        }
    }

    pub fn unit_var_names(&self) -> Vec<&'static str> {
        UNIT_VARS.iter().chain(self.role_unit_vars()).copied().collect()
    }

    pub fn unit_var_index(&self, name: &str) -> Result<usize> {
        UNIT_VARS
            .iter()
            .chain(self.role_unit_vars())
            .position(|v| *v == name)
            .ok_or_else(|| GateError::UnknownUnitVar(name.to_string()))
    }

    /// Value of variable `var_idx` on unit `ni`.
    pub fn unit_val_by_index(&self, var_idx: usize, ni: usize) -> Result<f32> {
        if ni >= self.len() {
            return Err(GateError::IndexOutOfRange { index: ni, len: self.len() });
        }
        let nr = &self.neurons;
        let val = match var_idx {
            0 => nr.act[ni],
            1 => nr.ext[ni],
            2 => nr.ge[ni],
            3 => nr.ge_raw[ni],
            4 => nr.act_lrn[ni],
            5 => nr.alpha_max[ni],
            6 => nr.pv_act[ni],
            _ => {
                let role_idx = var_idx - UNIT_VARS.len();
                match (&self.kind, role_idx) {
                    (LayerKind::PfcDeep(pfc), 0) => pfc.neurs.act_g[ni],
                    (LayerKind::PfcDeep(pfc), 1) => pfc.neurs.maint[ni],
                    (LayerKind::PfcDeep(pfc), 2) => pfc.neurs.maint_ge[ni],
                    (LayerKind::Matrix(m), 0) => m.da,
                    (LayerKind::Matrix(m), 1) => m.da_lrn,
                    (LayerKind::Matrix(m), 2) => m.ach,
                    _ => return Err(GateError::UnknownUnitVar(format!("#{var_idx}"))),
                }
            }
        };
        Ok(val)
    }

    pub fn unit_val(&self, name: &str, ni: usize) -> Result<f32> {
        let vi = self.unit_var_index(name)?;
        self.unit_val_by_index(vi, ni)
    }

    /// Values of `name` for every unit, in unit index order.
    pub fn unit_vals(&self, name: &str) -> Result<Vec<f32>> {
        let vi = self.unit_var_index(name)?;
        (0..self.len()).map(|ni| self.unit_val_by_index(vi, ni)).collect()
    }
}

impl Projection {
    fn role_syn_vars(&self) -> &'static [&'static str] {
        match self.kind {
            PrjnKind::Trace(_) => TRACE_SYN_VARS,
            PrjnKind::Standard => &[],
        }
    }

    pub fn syn_var_names(&self) -> Vec<&'static str> {
        SYN_VARS.iter().chain(self.role_syn_vars()).copied().collect()
    }

    pub fn syn_var_index(&self, name: &str) -> Result<usize> {
        SYN_VARS
            .iter()
            .chain(self.role_syn_vars())
            .position(|v| *v == name)
            .ok_or_else(|| GateError::UnknownSynVar(name.to_string()))
    }

    /// Value of variable `var_idx` on flat synapse index `si`.
    pub fn syn_val_by_index(&self, var_idx: usize, si: usize) -> Result<f32> {
        let n = self.store.total_synapses();
        let sy = self
            .store
            .synapses
            .get(si)
            .ok_or(GateError::IndexOutOfRange { index: si, len: n })?;
        let val = match var_idx {
            0 => sy.wt,
            1 => sy.dwt,
            2 => sy.norm,
            3 => sy.moment,
            _ => match (&self.kind, var_idx - SYN_VARS.len()) {
                (PrjnKind::Trace(tr), 0) => tr.syns[si].ntr,
                (PrjnKind::Trace(tr), 1) => tr.syns[si].tr,
                _ => return Err(GateError::UnknownSynVar(format!("#{var_idx}"))),
            },
        };
        Ok(val)
    }

    pub fn syn_val(&self, name: &str, si: usize) -> Result<f32> {
        let vi = self.syn_var_index(name)?;
        self.syn_val_by_index(vi, si)
    }
}
