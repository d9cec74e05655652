use crate::basic::time::norm_tow;
use crate::basic::var::*;
use log::debug;
use nalgebra::{Matrix3, Vector3};

/// rotation about the x axis (column-vector convention)
pub fn rot_x(t: f64) -> Matrix3<f64> {
    let (s, c) = t.sin_cos();
    Matrix3::new(
        1.0, 0.0, 0.0,
        0.0, c, -s,
        0.0, s, c,
    )
}

/// rotation about the z axis (column-vector convention)
pub fn rot_z(t: f64) -> Matrix3<f64> {
    let (s, c) = t.sin_cos();
    Matrix3::new(
        c, -s, 0.0,
        s, c, 0.0,
        0.0, 0.0, 1.0,
    )
}

/// perifocal to ECI: Rz(Omega) * Rx(i) * Rz(omega) applied to the PQW vector
pub fn pqw2eci(omg: f64, i0: f64, omg0: f64, pqw: &Vector3<f64>) -> Vector3<f64> {
    rot_z(omg0) * rot_x(i0) * rot_z(omg) * pqw
}

/// Earth rotation angle at `t_sec` of the week, one revolution per solar
/// day. The solar-day rate (not sidereal) is deliberate; receiver results
/// downstream depend on it, so it must not be corrected here.
pub fn earth_rotation_angle(t_sec: f64) -> f64 {
    let mut frac = (t_sec / SOLAR_DAY) % 1.0;
    if frac < 0.0 {
        frac += 1.0;
    }
    frac * 2.0 * PI
}

/// ECI to ECEF at `t_sec`: the frame rotates by theta, so the vector is
/// carried by the transposed rotation.
pub fn eci2ecef(t_sec: f64, eci: &Vector3<f64>) -> Vector3<f64> {
    rot_z(earth_rotation_angle(t_sec)).transpose() * eci
}

/// Solve Kepler's equation M = E - e*sin(E) by Newton iteration from E = M.
pub fn kepler_anomaly(m: f64, e: f64) -> f64 {
    let mut big_e = m;
    for _ in 0..MAX_ITER_KEPLER {
        let de = -(big_e - e * big_e.sin() - m) / (1.0 - e * big_e.cos());
        big_e += de;
        if de.abs() < RTOL_KEPLER {
            break;
        }
    }
    big_e
}

/// Propagate every observation slot of every PRN to ECI and ECEF.
///
/// A slot yields a state only when it has an observation time and a chosen
/// ephemeris, and every intermediate stays finite; anything else leaves
/// `None` and the epoch may still solve on the other satellites.
pub fn propagate(series: &[SatSeries], stats: &mut RunStats) -> Vec<SatStates> {
    let mut out: Vec<SatStates> = (0..=MAX_SAT)
        .map(|prn| SatStates { prn, ..SatStates::default() })
        .collect();

    for s in series.iter().skip(1) {
        let states = &mut out[s.prn];
        for k in 0..s.len() {
            states.t_ms.push(s.t_obs[k]);
            let state = propagate_slot(s.t_obs[k], s.kepler[k]);
            if state.is_none() && s.t_obs[k] != 0 && s.kepler[k].is_some() {
                stats.numeric_drops += 1;
                debug!("PRN {:02}: dropped sample {} (non-finite orbit)", s.prn, k);
            }
            match state {
                Some((eci, ecef)) => {
                    states.eci.push(Some(eci));
                    states.ecef.push(Some(ecef));
                }
                None => {
                    states.eci.push(None);
                    states.ecef.push(None);
                }
            }
        }
    }
    out
}

fn propagate_slot(t_obs: u32, kepler: Option<KeplerSet>) -> Option<(Vector3<f64>, Vector3<f64>)> {
    if t_obs == 0 {
        return None;
    }
    let kep = kepler?;

    if !(kep.a > 0.0) || !(kep.e >= 0.0 && kep.e < 1.0) || !kep.i0.is_finite() || !kep.m0.is_finite() {
        return None;
    }

    let t = norm_tow(t_obs as f64);
    let dt = t - kep.toe as f64;

    // mean motion and mean anomaly, normalized into [-pi, pi]
    let n = (MU / (kep.a * kep.a * kep.a)).sqrt();
    let m = (kep.m0 + n * dt + PI).rem_euclid(2.0 * PI) - PI;

    let big_e = kepler_anomaly(m, kep.e);
    let (sin_e, cos_e) = big_e.sin_cos();

    let sqrt1me2 = (1.0 - kep.e * kep.e).max(0.0).sqrt();
    let sinv = sqrt1me2 * sin_e / (1.0 - kep.e * cos_e);
    let cosv = (cos_e - kep.e) / (1.0 - kep.e * cos_e);
    let v = sinv.atan2(cosv);

    let r = kep.a * (1.0 - kep.e * cos_e);
    if !(r > 0.0) || !r.is_finite() {
        return None;
    }

    let pqw = Vector3::new(r * v.cos(), r * v.sin(), 0.0);
    let eci = pqw2eci(kep.omg, kep.i0, kep.omg0, &pqw);
    if !eci.iter().all(|x| x.is_finite()) {
        return None;
    }
    let ecef = eci2ecef(t, &eci);

    Some((eci, ecef))
}

/// Sweep true anomaly over a full revolution for each PRN with ephemeris,
/// producing the PQW and ECI orbit traces.
///
/// Only the first ephemeris issue of each PRN is used; the trace is a
/// visualization aid, not an input to the solver.
pub fn orbit_traces(eph_series: &[Vec<KeplerSet>]) -> Vec<OrbitTrace> {
    let n_steps = (2.0 * PI / ORBIT_STEP) as usize + 1;
    let max_store = n_steps + 1;

    let mut out: Vec<OrbitTrace> = (0..=MAX_SAT)
        .map(|prn| OrbitTrace { prn, ..OrbitTrace::default() })
        .collect();

    for prn in 1..=MAX_SAT {
        let kep = match eph_series[prn].first() {
            Some(kep) => *kep,
            None => continue,
        };
        let trace = &mut out[prn];

        for k in 0..max_store {
            let f = (k as f64 * ORBIT_STEP).min(2.0 * PI);

            let denom = 1.0 + kep.e * f.cos();
            if denom == 0.0 {
                trace.pqw.push(Vector3::zeros());
                trace.eci.push(Vector3::zeros());
                continue;
            }
            let r = kep.a * (1.0 - kep.e * kep.e) / denom;

            let pqw = Vector3::new(r * f.cos(), r * f.sin(), 0.0);
            trace.pqw.push(pqw);
            trace.eci.push(pqw2eci(kep.omg, kep.i0, kep.omg0, &pqw));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kepler_known_value() {
        // E - 0.01*sin(E) = pi/3
        let e = kepler_anomaly(PI / 3.0, 0.01);
        assert!((e - 1.055900993893844).abs() < 1E-9);
        assert!((e - 0.01 * e.sin() - PI / 3.0).abs() < 1E-12);
    }

    #[test]
    fn test_kepler_converges_fast_for_gps_eccentricities() {
        // within 5 iterations to |dE| residual < 1e-10 for e up to 0.1
        for &e in &[0.0, 0.02, 0.05, 0.1] {
            let mut m = -PI;
            while m < PI {
                let mut big_e = m;
                for _ in 0..5 {
                    let de = -(big_e - e * big_e.sin() - m) / (1.0 - e * big_e.cos());
                    big_e += de;
                }
                assert!((big_e - e * big_e.sin() - m).abs() < 1E-10);
                m += 0.1;
            }
        }
    }

    #[test]
    fn test_pqw2eci_identity_rotation() {
        let r = 26560e3;
        let eci = pqw2eci(0.0, 0.0, 0.0, &Vector3::new(r, 0.0, 0.0));
        assert!((eci - Vector3::new(r, 0.0, 0.0)).norm() < 1E-6);
    }

    #[test]
    fn test_pqw2eci_preserves_radius() {
        let pqw = Vector3::new(2.0e7, 1.5e7, 0.0);
        let eci = pqw2eci(0.3, 0.97, -1.2, &pqw);
        assert!((eci.norm() - pqw.norm()).abs() < 1E-6);
    }

    #[test]
    fn test_earth_rotation_angle() {
        assert_eq!(earth_rotation_angle(0.0), 0.0);
        assert!((earth_rotation_angle(21600.0) - PI / 2.0).abs() < 1E-12);
        // a full day wraps
        assert!(earth_rotation_angle(86400.0).abs() < 1E-12);
    }

    #[test]
    fn test_eci2ecef_quarter_day() {
        // at t = 21600 s the frame has turned 90 degrees: +x maps to -y
        let ecef = eci2ecef(21600.0, &Vector3::new(1.0, 0.0, 0.0));
        assert!((ecef - Vector3::new(0.0, -1.0, 0.0)).norm() < 1E-9);
    }

    #[test]
    fn test_propagate_circular_orbit_at_toe() {
        // e = 0, t = toe: the satellite sits at m0 along the orbit
        let kep = KeplerSet {
            a: 26560e3,
            e: 0.0,
            i0: 0.0,
            omg0: 0.0,
            omg: 0.0,
            m0: 0.0,
            toe: 159_348,
        };
        let (eci, _) = propagate_slot(159_348_000, Some(kep)).unwrap();
        assert!((eci - Vector3::new(26560e3, 0.0, 0.0)).norm() < 1E-3);
    }

    #[test]
    fn test_propagate_rejects_bad_elements() {
        let mut kep = KeplerSet {
            a: 0.0,
            e: 0.0,
            i0: 0.0,
            omg0: 0.0,
            omg: 0.0,
            m0: 0.0,
            toe: 0,
        };
        assert!(propagate_slot(159_348_000, Some(kep)).is_none());
        kep.a = 26560e3;
        kep.e = 1.5;
        assert!(propagate_slot(159_348_000, Some(kep)).is_none());
        // no time, no state
        kep.e = 0.0;
        assert!(propagate_slot(0, Some(kep)).is_none());
        assert!(propagate_slot(159_348_000, None).is_none());
    }

    #[test]
    fn test_orbit_trace_radius_and_clamp() {
        let kep = KeplerSet {
            a: 26560e3,
            e: 0.02,
            i0: 0.9,
            omg0: 1.0,
            omg: -0.5,
            m0: 0.0,
            toe: 0,
        };
        let mut series = vec![Vec::new(); MAX_SAT + 1];
        series[7].push(kep);
        let traces = orbit_traces(&series);

        let trace = &traces[7];
        assert_eq!(trace.eci.len(), (2.0 * PI / ORBIT_STEP) as usize + 2);
        // perigee and apogee bound every radius
        let rp = kep.a * (1.0 - kep.e);
        let ra = kep.a * (1.0 + kep.e);
        for p in &trace.eci {
            let r = p.norm();
            assert!(r >= rp - 1.0 && r <= ra + 1.0);
        }
        // final sample is clamped to f = 2*pi, closing the loop
        let first = trace.pqw.first().unwrap();
        let last = trace.pqw.last().unwrap();
        assert!((first - last).norm() < 1E-3);
        // PRNs without ephemeris stay empty
        assert!(traces[8].eci.is_empty());
    }
}
