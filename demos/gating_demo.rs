//! Gating demo: store-ignore-recall with two PFC stripes.
//!
//! Builds a small basal-ganglia / PFC loop:
//!   - `Input` drives two maintenance stripes (`PFCmnt` / `PFCmntD`)
//!   - an output gate (`PFCout` / `PFCoutD`) reads them out in Q1
//!   - `MtxGo` (D1) and `MtxNo` (D2) learn from the deep maintenance layer by
//!     dopamine-modulated eligibility traces, gated by `VThal`
//!   - `PosPV` broadcasts reward into both matrix layers in Q4
//!
//! Each trial gates one stripe, alternating. The stripe gated on even trials is
//! rewarded, so Go weights from it rise and NoGo weights fall.
//!
//! Run: cargo run --example gating_demo

use gatepool::{
    ClampedDynamics, DaReceptor, ExternalDynamics, LayerKind, MatrixState, Network, Pattern,
    PfcDeepState, PfcDyns, PrjnKind, PvMonitor, PvParams, PvState, Shape, SimTime,
};

const TRIALS: usize = 40;
const CYCLES_PER_QUARTER: u32 = 25;

fn main() -> gatepool::Result<()> {
    env_logger::init();

    println!("=== gatepool demo: stripe gating + trace learning ===\n");

    let stripes = Shape::new(1, 2, 1, 2);
    let mut net = Network::new("pbwm");
    net.add_layer("Input", Shape::flat(1, 4), LayerKind::Plain)?;
    net.add_layer("PFCmnt", stripes, LayerKind::Plain)?;
    let mnt = PfcDeepState::maint_gate().with_dyns(PfcDyns::maint_only());
    net.add_layer("PFCmntD", stripes, LayerKind::PfcDeep(mnt))?;
    net.add_layer("PFCout", stripes, LayerKind::Plain)?;
    net.add_layer("PFCoutD", stripes, LayerKind::PfcDeep(PfcDeepState::out_gate()))?;
    net.add_layer("VThal", stripes, LayerKind::Plain)?;
    net.add_layer("MtxGo", stripes, LayerKind::Matrix(MatrixState::new(DaReceptor::D1)))?;
    net.add_layer("MtxNo", stripes, LayerKind::Matrix(MatrixState::new(DaReceptor::D2)))?;
    net.add_layer("PosPV", stripes, LayerKind::Pv(PvState::new(PvParams::default())))?;

    for name in ["Input", "VThal"] {
        if let Some(ly) = net.layer_by_name_mut(name) {
            ly.dynamics = Box::new(ClampedDynamics);
        }
    }
    for name in ["MtxGo", "MtxNo"] {
        if let Some(ly) = net.layer_by_name_mut(name) {
            ly.dynamics = Box::new(ExternalDynamics);
        }
    }

    net.connect("Input", "PFCmnt", Pattern::Full, PrjnKind::Standard)?;
    net.connect("PFCmntD", "PFCout", Pattern::OneToOne, PrjnKind::Standard)?;
    let go = net.connect("PFCmntD", "MtxGo", Pattern::PoolOneToOne, PrjnKind::trace())?;
    let nogo = net.connect("PFCmntD", "MtxNo", Pattern::PoolOneToOne, PrjnKind::trace())?;
    for id in [go, nogo] {
        if let Some(pj) = net.prjn_mut(id) {
            pj.learn.lrate = 0.1;
        }
    }
    net.add_pv_receiver("PosPV", "MtxGo")?;
    net.add_pv_receiver("PosPV", "MtxNo")?;
    net.build()?;

    println!("{}", net.stats());

    let mut time = SimTime::new(CYCLES_PER_QUARTER);
    for trial in 0..TRIALS {
        let stripe = trial % 2;
        let rewarded = stripe == 0;

        let mut input = [0.0f32; 4];
        input[stripe * 2] = 1.0;
        input[stripe * 2 + 1] = 1.0;
        net.apply_ext("Input", &input)?;

        let mut thal = [0.0f32; 4];
        thal[stripe * 2] = 1.0;
        thal[stripe * 2 + 1] = 1.0;
        net.apply_ext("VThal", &thal)?;
        net.set_act("MtxGo", &[0.5; 4])?;
        net.set_act("MtxNo", &[0.5; 4])?;

        let pv = if rewarded { [1.0f32; 4] } else { [0.0; 4] };
        net.apply_ext("PosPV", &pv)?;

        let da = if rewarded { 1.0 } else { -0.5 };
        for mtx in ["MtxGo", "MtxNo"] {
            net.set_da(mtx, da)?;
            net.set_ach(mtx, 0.25)?;
        }

        net.alpha_cyc_init(&mut time);
        for _ in 0..4 {
            if time.quarter == gatepool::Quarter::Q1 {
                net.set_gate("PFCmntD", stripe, true, 1.0)?;
                net.set_gate("PFCoutD", 1 - stripe, true, 1.0)?;
            }
            net.run_quarter(&mut time)?;
        }
        net.dwt()?;
        net.wt_from_dwt();

        if trial % 10 == 0 || trial == TRIALS - 1 {
            let go_w0 = net.prjn(go).map_or(0.0, |p| p.syn_val("Wt", 0).unwrap_or(0.0));
            let no_w0 = net.prjn(nogo).map_or(0.0, |p| p.syn_val("Wt", 0).unwrap_or(0.0));
            let reward = net.pv_monitor_val("PosPV", PvMonitor::TotalAct)?;
            println!(
                "Trial {:3} | stripe {} | PV={:.1} | Go wt[0]={:.3} | NoGo wt[0]={:.3}",
                trial, stripe, reward, go_w0, no_w0
            );
            for g in net.gate_stats() {
                println!("    {}", g);
            }
        }
    }

    println!("\n{}", net.stats());
    Ok(())
}
