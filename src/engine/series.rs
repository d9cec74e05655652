use crate::basic::time::norm_tow;
use crate::basic::var::*;
use crate::decode::store::{History, ObsKind};
use crate::error::Error;
use log::debug;

/// Select the ephemeris with the largest TOE at or before the observation
/// time. Equal TOEs keep the first-arrived issue.
pub fn select_eph(list: &[Eph], tow_ms: u32) -> Option<&Eph> {
    let t = norm_tow(tow_ms as f64);
    let mut best: Option<&Eph> = None;
    for eph in list {
        if (eph.toe as f64) > t {
            continue;
        }
        match best {
            None => best = Some(eph),
            Some(b) if eph.toe > b.toe => best = Some(eph),
            _ => {}
        }
    }
    best
}

/// Unique-by-TOE ephemeris list per PRN, in arrival order. Drives the orbit
/// sampler independently of observation timing.
pub fn eph_series(hist: &History) -> Vec<Vec<KeplerSet>> {
    let mut out: Vec<Vec<KeplerSet>> = vec![Vec::new(); MAX_SAT + 1];
    for prn in 1..=MAX_SAT {
        for eph in &hist.eph[prn] {
            if out[prn].iter().any(|k| k.toe == eph.toe) {
                continue;
            }
            out[prn].push(KeplerSet::from_eph(eph));
        }
    }
    out
}

/// Build the dense per-PRN observation series: pseudorange, observation
/// time, and the Keplerian elements chosen for each slot.
///
/// Slot k of PRN p comes from the k-th record stored under p; the PRN's
/// pseudorange is looked up by its position in that record's satellite list.
/// Slots with no usable ephemeris keep `None` and are skipped downstream.
pub fn build_series(hist: &History, stats: &mut RunStats) -> Result<Vec<SatSeries>, Error> {
    let mut series: Vec<SatSeries> = (0..=MAX_SAT)
        .map(|prn| SatSeries { prn, ..SatSeries::default() })
        .collect();

    let kind = match hist.kind {
        Some(kind) => kind,
        None => {
            let has_obs = (1..=MAX_SAT).any(|p| !hist.msm4[p].is_empty() || !hist.msm1[p].is_empty());
            if has_obs {
                // observations without a latched family cannot be attributed
                return Err(Error::ObservationType(0));
            }
            return Ok(series);
        }
    };

    for prn in 1..=MAX_SAT {
        match kind {
            ObsKind::Msm4 => {
                for rec in &hist.msm4[prn] {
                    let obs = rec
                        .prn
                        .iter()
                        .position(|&p| p == prn)
                        .map(|j| (rec.pseudorange.get(j).copied().unwrap_or(0.0), rec.tow_ms));
                    push_slot(&mut series[prn], &hist.eph[prn], obs, stats);
                }
            }
            ObsKind::Legacy => {
                for rec in &hist.msm1[prn] {
                    let obs = rec
                        .prn
                        .iter()
                        .position(|&p| p == prn)
                        .map(|j| (rec.pseudorange.get(j).copied().unwrap_or(0.0), rec.tow_ms));
                    push_slot(&mut series[prn], &hist.eph[prn], obs, stats);
                }
            }
        }
        if !series[prn].is_empty() {
            debug!(
                "PRN {:02}: {} obs slots, {} with pseudorange",
                prn,
                series[prn].len(),
                series[prn].valid_count()
            );
        }
    }

    Ok(series)
}

fn push_slot(
    series: &mut SatSeries,
    ephs: &[Eph],
    obs: Option<(f64, u32)>,
    stats: &mut RunStats,
) {
    let (pr, t) = match obs {
        Some(obs) => obs,
        // record stored under this PRN but the PRN is not in its list;
        // keep the slot so indices stay aligned with the history
        None => (0.0, 0),
    };
    series.pseudorange.push(pr);
    series.t_obs.push(t);

    let kepler = if t != 0 {
        let chosen = select_eph(ephs, t).map(KeplerSet::from_eph);
        if chosen.is_none() {
            stats.missing_eph += 1;
        }
        chosen
    } else {
        None
    };
    series.kepler.push(kepler);
}

/// Per-PRN table summary in the style of the solver's pre-flight report.
pub fn series_summary(series: &[SatSeries]) -> String {
    let mut out = String::new();
    out.push_str("PRN | slots | with PR | with eph | first t (ms) | last t (ms)\n");
    for s in series.iter().skip(1) {
        if s.is_empty() {
            continue;
        }
        let with_eph = s.kepler.iter().filter(|k| k.is_some()).count();
        let first = s.t_obs.iter().find(|&&t| t != 0).copied().unwrap_or(0);
        let last = s.t_obs.iter().rev().find(|&&t| t != 0).copied().unwrap_or(0);
        out.push_str(&format!(
            "{:3} | {:5} | {:7} | {:8} | {:12} | {:11}\n",
            s.prn,
            s.len(),
            s.valid_count(),
            with_eph,
            first,
            last
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eph_with(prn: usize, toe: u32, m0: f64) -> Eph {
        let mut eph = Eph::default();
        eph.prn = prn;
        eph.toe = toe;
        eph.m0 = m0;
        eph.a = 26560e3;
        eph
    }

    fn msm4_single(prn: usize, tow_ms: u32, pr: f64) -> Msm4 {
        let mut msm4 = Msm4::default();
        msm4.tow_ms = tow_ms;
        msm4.nsat = 1;
        msm4.prn = vec![prn];
        msm4.cell_prn = vec![prn];
        msm4.ncell = 1;
        msm4.pseudorange = vec![pr];
        msm4
    }

    #[test]
    fn test_select_largest_toe_at_or_before() {
        let ephs = vec![eph_with(5, 144000, 0.1), eph_with(5, 151200, 0.2), eph_with(5, 158400, 0.3)];
        // t = 155000 s of week, as milliseconds
        let chosen = select_eph(&ephs, 155_000_000).unwrap();
        assert_eq!(chosen.toe, 151200);
        // before every TOE: nothing selectable
        assert!(select_eph(&ephs, 100_000_000).is_none());
        // exactly at a TOE boundary
        assert_eq!(select_eph(&ephs, 158_400_000).unwrap().toe, 158400);
    }

    #[test]
    fn test_equal_toe_keeps_first_arrival() {
        let first = eph_with(5, 151200, 0.111);
        let second = eph_with(5, 151200, 0.222);
        let pair = [first, second];
        let chosen = select_eph(&pair, 155_000_000).unwrap();
        assert_eq!(chosen.m0, 0.111);
        // permuting unequal entries around the tie does not change the pick
        let quad = [eph_with(5, 144000, 0.0), first, second, eph_with(5, 100800, 0.0)];
        let chosen = select_eph(
            &quad,
            155_000_000,
        )
        .unwrap();
        assert_eq!(chosen.m0, 0.111);
    }

    #[test]
    fn test_series_alignment_and_selection() {
        let mut hist = History::new();
        let mut stats = RunStats::default();
        hist.store_ephemeris(eph_with(5, 144000, 0.1), &mut stats);
        hist.store_ephemeris(eph_with(5, 151200, 0.2), &mut stats);
        hist.store_msm4(msm4_single(5, 150_000_000, 2.1e7), &mut stats).unwrap();
        hist.store_msm4(msm4_single(5, 152_000_000, 2.2e7), &mut stats).unwrap();

        let series = build_series(&hist, &mut stats).unwrap();
        let s = &series[5];
        assert_eq!(s.len(), 2);
        assert_eq!(s.t_obs, vec![150_000_000, 152_000_000]);
        assert_eq!(s.pseudorange, vec![2.1e7, 2.2e7]);
        // invariant: chosen TOE <= t_obs and it is the largest such TOE
        assert_eq!(s.kepler[0].unwrap().toe, 144000);
        assert_eq!(s.kepler[1].unwrap().toe, 151200);
        assert_eq!(stats.missing_eph, 0);
    }

    #[test]
    fn test_missing_ephemeris_leaves_none() {
        let mut hist = History::new();
        let mut stats = RunStats::default();
        hist.store_msm4(msm4_single(9, 150_000_000, 2.1e7), &mut stats).unwrap();
        let series = build_series(&hist, &mut stats).unwrap();
        assert!(series[9].kepler[0].is_none());
        assert_eq!(stats.missing_eph, 1);
    }

    #[test]
    fn test_eph_series_unique_by_toe() {
        let mut hist = History::new();
        let mut stats = RunStats::default();
        hist.store_ephemeris(eph_with(5, 144000, 0.1), &mut stats);
        hist.store_ephemeris(eph_with(5, 144000, 0.9), &mut stats);
        hist.store_ephemeris(eph_with(5, 151200, 0.2), &mut stats);
        let es = eph_series(&hist);
        assert_eq!(es[5].len(), 2);
        assert_eq!(es[5][0].toe, 144000);
        assert_eq!(es[5][0].m0, 0.1); // first arrival kept
        assert_eq!(es[5][1].toe, 151200);
    }
}
