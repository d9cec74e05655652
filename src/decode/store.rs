use crate::basic::var::*;
use crate::error::Error;
use array_init::array_init;
use log::warn;

/// Observation family of the run, latched by the first observation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObsKind {
    /// legacy 1002 stream
    Legacy = 1,
    /// MSM4 1074 stream
    Msm4 = 4,
}

/// Per-PRN accumulation tables (slot 0 unused).
///
/// Observation records are appended whole under every PRN the message lists,
/// so each satellite's slot k holds the complete message that produced its
/// k-th observation.
#[derive(Debug, Clone)]
pub struct History {
    pub eph: [Vec<Eph>; MAX_SAT + 1],
    pub msm4: [Vec<Msm4>; MAX_SAT + 1],
    pub msm1: [Vec<Msm1>; MAX_SAT + 1],
    pub kind: Option<ObsKind>,
}

impl History {
    pub fn new() -> Self {
        History {
            eph: array_init(|_| Vec::new()),
            msm4: array_init(|_| Vec::new()),
            msm1: array_init(|_| Vec::new()),
            kind: None,
        }
    }

    /// Append an ephemeris issue to its PRN's history. Duplicate TOEs are
    /// kept here; the series builder dedups when it needs to.
    pub fn store_ephemeris(&mut self, eph: Eph, stats: &mut RunStats) {
        let prn = eph.prn;
        if !(1..=MAX_SAT).contains(&prn) {
            stats.malformed += 1;
            return;
        }
        if self.eph[prn].len() >= MAX_EPH_HISTORY {
            warn!("{}", Error::Capacity(prn));
            stats.capacity_drops += 1;
            return;
        }
        self.eph[prn].push(eph);
        stats.eph_msgs += 1;
    }

    /// Append an MSM4 record under every PRN it lists.
    pub fn store_msm4(&mut self, msm4: Msm4, stats: &mut RunStats) -> Result<(), Error> {
        self.latch(ObsKind::Msm4)?;

        for &prn in &msm4.prn {
            if !(1..=MAX_SAT).contains(&prn) {
                continue;
            }
            if self.msm4[prn].len() >= MAX_EPOCHS {
                warn!("{}", Error::Capacity(prn));
                stats.capacity_drops += 1;
                continue;
            }
            self.msm4[prn].push(msm4.clone());
        }
        stats.obs_msgs += 1;
        Ok(())
    }

    /// Append a legacy 1002 record under every PRN it lists.
    pub fn store_msm1(&mut self, msm1: Msm1, stats: &mut RunStats) -> Result<(), Error> {
        self.latch(ObsKind::Legacy)?;

        for &prn in &msm1.prn {
            if !(1..=MAX_SAT).contains(&prn) {
                continue;
            }
            if self.msm1[prn].len() >= MAX_EPOCHS {
                warn!("{}", Error::Capacity(prn));
                stats.capacity_drops += 1;
                continue;
            }
            self.msm1[prn].push(msm1.clone());
        }
        stats.obs_msgs += 1;
        Ok(())
    }

    fn latch(&mut self, kind: ObsKind) -> Result<(), Error> {
        match self.kind {
            None => {
                self.kind = Some(kind);
                Ok(())
            }
            Some(active) if active == kind => Ok(()),
            Some(active) => Err(Error::MixedStream {
                active: msg_type_of(active),
                found: msg_type_of(kind),
            }),
        }
    }
}

impl Default for History {
    fn default() -> Self {
        History::new()
    }
}

fn msg_type_of(kind: ObsKind) -> u16 {
    match kind {
        ObsKind::Legacy => 1002,
        ObsKind::Msm4 => 1074,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msm4_for(prns: &[usize], tow_ms: u32) -> Msm4 {
        let mut msm4 = Msm4::default();
        msm4.tow_ms = tow_ms;
        msm4.nsat = prns.len();
        msm4.prn = prns.to_vec();
        msm4
    }

    #[test]
    fn test_record_duplicated_per_prn() {
        let mut hist = History::new();
        let mut stats = RunStats::default();
        hist.store_msm4(msm4_for(&[5, 13, 21], 1000), &mut stats).unwrap();
        hist.store_msm4(msm4_for(&[5, 21], 2000), &mut stats).unwrap();

        assert_eq!(hist.msm4[5].len(), 2);
        assert_eq!(hist.msm4[13].len(), 1);
        assert_eq!(hist.msm4[21].len(), 2);
        assert_eq!(hist.msm4[7].len(), 0);
        // each PRN sees the full record at its own next slot
        assert_eq!(hist.msm4[21][1].tow_ms, 2000);
        assert_eq!(hist.msm4[21][1].prn, vec![5, 21]);
    }

    #[test]
    fn test_out_of_range_prn_skipped() {
        let mut hist = History::new();
        let mut stats = RunStats::default();
        hist.store_msm4(msm4_for(&[0, 33, 7], 1000), &mut stats).unwrap();
        assert_eq!(hist.msm4[7].len(), 1);
        assert_eq!(stats.capacity_drops, 0);
    }

    #[test]
    fn test_mixed_stream_is_fatal() {
        let mut hist = History::new();
        let mut stats = RunStats::default();
        hist.store_msm4(msm4_for(&[5], 1000), &mut stats).unwrap();

        let mut msm1 = Msm1::default();
        msm1.prn = vec![5];
        let err = hist.store_msm1(msm1, &mut stats).unwrap_err();
        assert!(matches!(err, Error::MixedStream { active: 1074, found: 1002 }));
    }

    #[test]
    fn test_eph_capacity_drop() {
        let mut hist = History::new();
        let mut stats = RunStats::default();
        let mut eph = Eph::default();
        eph.prn = 3;
        for _ in 0..MAX_EPH_HISTORY {
            hist.store_ephemeris(eph, &mut stats);
        }
        assert_eq!(hist.eph[3].len(), MAX_EPH_HISTORY);
        hist.store_ephemeris(eph, &mut stats);
        assert_eq!(hist.eph[3].len(), MAX_EPH_HISTORY);
        assert_eq!(stats.capacity_drops, 1);
    }
}
