use crate::basic::func::sqr;
use crate::basic::geo::ecef2geodetic;
use crate::basic::var::*;
use crate::error::Error;
use log::{debug, warn};
use nalgebra::{DMatrix, DVector, Matrix4, Vector3, Vector4};

/// Sorted, duplicate-free list of observation times across all PRNs,
/// capped at MAX_UNIQUE_EPOCHS before the sort.
pub fn collect_epochs(series: &[SatSeries]) -> Vec<u32> {
    let mut times: Vec<u32> = Vec::new();
    'collect: for s in series.iter().skip(1) {
        for &t in &s.t_obs {
            if t == 0 {
                continue;
            }
            if times.len() >= MAX_UNIQUE_EPOCHS {
                break 'collect;
            }
            times.push(t);
        }
    }
    times.sort_unstable();
    times.dedup();
    times
}

/// Gather the satellites observed at epoch `t`: the first slot per PRN with
/// a matching time, a propagated ECEF state, and a usable pseudorange.
pub fn gather_epoch(
    t: u32,
    series: &[SatSeries],
    states: &[SatStates],
) -> (Vec<Vector3<f64>>, Vec<f64>) {
    let mut ecefs = Vec::new();
    let mut prs = Vec::new();

    for s in series.iter().skip(1) {
        let st = &states[s.prn];
        for k in 0..s.len() {
            if s.t_obs[k] != t {
                continue;
            }
            if let Some(ecef) = st.ecef.get(k).copied().flatten() {
                if s.pseudorange[k] > 0.0 {
                    ecefs.push(ecef);
                    prs.push(s.pseudorange[k]);
                    break;
                }
            }
        }
    }
    (ecefs, prs)
}

/// 4x4 inverse by Gauss-Jordan elimination with partial pivoting. A pivot
/// magnitude at or below SINGULAR_PIVOT reports the matrix as singular.
pub fn invert4(a: &Matrix4<f64>) -> Option<Matrix4<f64>> {
    let mut aug = [[0.0f64; 8]; 4];
    for r in 0..4 {
        for c in 0..4 {
            aug[r][c] = a[(r, c)];
        }
        aug[r][4 + r] = 1.0;
    }

    for col in 0..4 {
        let mut piv = col;
        let mut maxabs = aug[piv][col].abs();
        for r in col + 1..4 {
            if aug[r][col].abs() > maxabs {
                maxabs = aug[r][col].abs();
                piv = r;
            }
        }
        if maxabs <= SINGULAR_PIVOT {
            return None;
        }
        if piv != col {
            aug.swap(piv, col);
        }
        let invpiv = 1.0 / aug[col][col];
        for c in 0..8 {
            aug[col][c] *= invpiv;
        }
        for r in 0..4 {
            if r == col {
                continue;
            }
            let f = aug[r][col];
            if f != 0.0 {
                for c in 0..8 {
                    aug[r][c] -= f * aug[col][c];
                }
            }
        }
    }

    let mut inv = Matrix4::zeros();
    for r in 0..4 {
        for c in 0..4 {
            inv[(r, c)] = aug[r][4 + c];
        }
    }
    Some(inv)
}

/// Gauss-Newton point solution of receiver position and clock bias from one
/// epoch's satellite positions and pseudoranges.
///
/// Runs the fixed iteration budget from the origin with no convergence
/// test; returns `None` when the normal-equation matrix goes singular.
pub fn solve_epoch(ecefs: &[Vector3<f64>], prs: &[f64]) -> Option<(Vector3<f64>, f64)> {
    let m = ecefs.len();
    let mut pos = Vector3::zeros();
    let mut cdt = 0.0;

    for it in 0..MAXITR {
        let mut g = DMatrix::zeros(m, 4);
        let mut y = DVector::zeros(m);

        for i in 0..m {
            let los = ecefs[i] - pos;
            let mut r = los.norm();
            if !(r > 0.0) || !r.is_finite() {
                r = 1.0;
            }
            let u = los / r;

            y[i] = prs[i] - r - cdt;
            g[(i, 0)] = -u[0];
            g[(i, 1)] = -u[1];
            g[(i, 2)] = -u[2];
            g[(i, 3)] = 1.0;
        }

        // normal equations (G'G) dx = G'y with a dense 4x4 inverse
        let gt = g.transpose();
        let gtg = &gt * &g;
        let gty = &gt * &y;

        let mut ata = Matrix4::zeros();
        let mut aty = Vector4::zeros();
        for r in 0..4 {
            for c in 0..4 {
                ata[(r, c)] = gtg[(r, c)];
            }
            aty[r] = gty[r];
        }

        let inv = invert4(&ata)?;
        let delta = inv * aty;

        pos += Vector3::new(delta[0], delta[1], delta[2]);
        cdt += delta[3];

        let rms = (y.iter().map(|v| sqr(*v)).sum::<f64>() / m as f64).sqrt();
        debug!("iter {}: rms {:.3} m, clock bias {:.6} m", it, rms, cdt);
    }

    Some((pos, cdt))
}

/// Estimate the receiver track over every unique observation epoch.
///
/// Epochs with fewer than MIN_SATS usable satellites, or with singular
/// geometry, keep a `None` at their index.
pub fn estimate_positions(
    series: &[SatSeries],
    states: &[SatStates],
    stats: &mut RunStats,
) -> ReceiverTrack {
    let times = collect_epochs(series);
    stats.epochs = times.len();
    debug!("total epochs = {}", times.len());

    for s in series.iter().skip(1) {
        let pr_cnt = s.valid_count();
        if pr_cnt == 0 {
            continue;
        }
        let ecef_rows = states[s.prn].ecef.iter().filter(|p| p.is_some()).count();
        let first = s.t_obs.iter().find(|&&t| t != 0).copied().unwrap_or(0);
        let last = s.t_obs.iter().rev().find(|&&t| t != 0).copied().unwrap_or(0);
        debug!(
            "SV {:02}: PR samples={}, ECEF shape=({},3); first PR time={}, last PR time={}",
            s.prn, pr_cnt, ecef_rows, first, last
        );
    }

    let mut track = ReceiverTrack {
        t_ms: times.clone(),
        ecef: Vec::with_capacity(times.len()),
        lla: Vec::with_capacity(times.len()),
    };

    for (ti, &t) in times.iter().enumerate() {
        let (ecefs, prs) = gather_epoch(t, series, states);

        if ecefs.len() < MIN_SATS {
            stats.skipped_epochs += 1;
            track.ecef.push(None);
            track.lla.push(None);
            continue;
        }

        match solve_epoch(&ecefs, &prs) {
            Some((pos, _cdt)) => {
                let lla = ecef2geodetic(&[pos[0], pos[1], pos[2]]);
                debug!(
                    "epoch {}: LLA = (lat={:.8} deg, lon={:.8} deg, alt={:.3} m)",
                    ti, lla[0], lla[1], lla[2]
                );
                track.ecef.push(Some(pos));
                track.lla.push(Some(lla));
                stats.solved_epochs += 1;
            }
            None => {
                warn!("{}", Error::SingularGeometry(ti));
                stats.singular_epochs += 1;
                track.ecef.push(None);
                track.lla.push(None);
            }
        }
    }
    track
}
