use crate::basic::var::*;
use crate::decode::field::{cell_key, field, raw_field};
use crate::error::Error;

/// Message type key used for dispatch.
pub fn msg_type(line: &str) -> Option<u16> {
    field(line, "DF002")
}

/// Full MSM4 pseudorange from its three components (m).
pub fn msm4_pseudorange(rough_ms: u32, mod1s: f64, fine: f64) -> f64 {
    CLIGHT * (rough_ms as f64 * 1E-3) + mod1s + fine
}

/// Full legacy (1002) pseudorange from ambiguity (ms) and remainder (m).
pub fn legacy_pseudorange(amb_ms: u32, remainder: f64) -> f64 {
    amb_ms as f64 * (CLIGHT / 1000.0) + remainder
}

/// decode GPS ephemeris (RTCM 1019)
///
/// The broadcast scalings are applied here and nowhere else: the four
/// angular fields are in semicircles and multiplied by pi, the eccentricity
/// carries a 2^-33 factor, and the semi-major axis is the square of the
/// broadcast sqrt(A).
pub fn decode_1019(line: &str) -> Result<Eph, Error> {
    let prn: usize =
        field(line, "DF009").ok_or_else(|| Error::InputMalformed(String::from("1019 without DF009")))?;
    if !(1..=MAX_SAT).contains(&prn) {
        return Err(Error::InputMalformed(format!("1019 PRN {} out of range", prn)));
    }

    let mut eph = Eph::default();
    eph.prn = prn;
    eph.week = field(line, "DF076").unwrap_or(0);
    eph.sva = field(line, "DF077").unwrap_or(0);
    eph.code = field(line, "DF078").unwrap_or(0);
    eph.idot = field(line, "DF079").unwrap_or(0.0);
    eph.iode = field(line, "DF071").unwrap_or(0);
    eph.toc = field(line, "DF081").unwrap_or(0);
    eph.f2 = field(line, "DF082").unwrap_or(0.0);
    eph.f1 = field(line, "DF083").unwrap_or(0.0);
    eph.f0 = field(line, "DF084").unwrap_or(0.0);
    eph.iodc = field(line, "DF085").unwrap_or(0);
    eph.crs = field(line, "DF086").unwrap_or(0.0);
    eph.deln = field(line, "DF087").unwrap_or(0.0);
    eph.m0 = field::<f64>(line, "DF088").unwrap_or(0.0) * PI;
    eph.cuc = field(line, "DF089").unwrap_or(0.0);
    eph.e = field::<f64>(line, "DF090").unwrap_or(0.0) * 2f64.powi(-33);
    eph.cus = field(line, "DF091").unwrap_or(0.0);
    eph.sqrt_a = field(line, "DF092").unwrap_or(0.0);
    eph.a = eph.sqrt_a * eph.sqrt_a;
    eph.toe = field(line, "DF093").unwrap_or(0);
    eph.cic = field(line, "DF094").unwrap_or(0.0);
    eph.omg0 = field::<f64>(line, "DF095").unwrap_or(0.0) * PI;
    eph.cis = field(line, "DF096").unwrap_or(0.0);
    eph.i0 = field::<f64>(line, "DF097").unwrap_or(0.0) * PI;
    eph.crc = field(line, "DF098").unwrap_or(0.0);
    eph.omg = field::<f64>(line, "DF099").unwrap_or(0.0) * PI;
    eph.omgd = field(line, "DF100").unwrap_or(0.0);
    eph.tgd = field(line, "DF101").unwrap_or(0.0);
    eph.svh = field(line, "DF102").unwrap_or(0);
    eph.flag = field(line, "DF103").unwrap_or(0);
    eph.fit = field(line, "DF137").unwrap_or(0);

    Ok(eph)
}

/// decode MSM4 observations (RTCM 1074), keeping L1 C/A cells only
///
/// The rough range components (DF397/DF398) arrive per satellite, the fine
/// components (DF400..) per cell; retained cells recombine with the rough
/// values at the same index, matching the one-L1-cell-per-satellite layout
/// of the upstream logs. Cells with an unusable PRN or signal carry a -1.0
/// pseudorange.
pub fn decode_1074(line: &str) -> Result<Msm4, Error> {
    let mut msm4 = Msm4::default();
    msm4.msg_type = field(line, "DF002").unwrap_or(0);
    msm4.staid = field(line, "DF003").unwrap_or(0);
    msm4.tow_ms = field(line, "DF004")
        .ok_or_else(|| Error::InputMalformed(String::from("1074 without DF004")))?;
    msm4.sync = field(line, "DF393").unwrap_or(0);
    msm4.iods = field(line, "DF409").unwrap_or(0);
    msm4.clk_steering = field(line, "DF411").unwrap_or(0);
    msm4.ext_clock = field(line, "DF412").unwrap_or(0);
    msm4.nsat = field(line, "NSat").unwrap_or(0);
    msm4.nsig = field(line, "NSig").unwrap_or(0);
    let ncell: usize = field(line, "NCell").unwrap_or(0);

    for i in 1..=msm4.nsat {
        msm4.prn.push(field(line, &cell_key("PRN", i)).unwrap_or(0));
        msm4.rough_ms.push(field(line, &cell_key("DF397", i)).unwrap_or(0));
        msm4.rough_mod1s.push(field(line, &cell_key("DF398", i)).unwrap_or(0.0));
    }

    // first pass filters the cell list to "1C", second pass harvests the
    // fine fields aligned to the filtered order
    for i in 1..=ncell {
        match raw_field(line, &cell_key("CELLSIG", i)) {
            Some("1C") => {}
            _ => continue,
        }
        let prn: usize = field(line, &cell_key("CELLPRN", i)).unwrap_or(0);
        msm4.cell_prn.push(prn);
        msm4.fine.push(field(line, &cell_key("DF400", i)).unwrap_or(0.0));
        msm4.phase.push(field(line, &cell_key("DF401", i)).unwrap_or(0.0));
        msm4.lock.push(field(line, &cell_key("DF402", i)).unwrap_or(0));
        msm4.half_amb.push(field(line, &cell_key("DF420", i)).unwrap_or(0));
        msm4.cnr.push(field(line, &cell_key("DF403", i)).unwrap_or(0));
    }
    msm4.ncell = msm4.cell_prn.len();

    for i in 0..msm4.ncell {
        let pr = if msm4.cell_prn[i] > 0 && i < msm4.nsat {
            msm4_pseudorange(msm4.rough_ms[i], msm4.rough_mod1s[i], msm4.fine[i])
        } else {
            -1.0
        };
        msm4.pseudorange.push(pr);
    }

    Ok(msm4)
}

/// decode legacy L1 observations (RTCM 1002)
pub fn decode_1002(line: &str) -> Result<Msm1, Error> {
    let mut msm1 = Msm1::default();
    msm1.msg_type = field(line, "DF002").unwrap_or(0);
    msm1.staid = field(line, "DF003").unwrap_or(0);
    msm1.tow_ms = field(line, "DF004")
        .ok_or_else(|| Error::InputMalformed(String::from("1002 without DF004")))?;
    msm1.sync = field(line, "DF005").unwrap_or(0);
    msm1.nsat = field(line, "DF006").unwrap_or(0);
    msm1.smooth = field(line, "DF007").unwrap_or(0);
    msm1.smooth_int = field(line, "DF008").unwrap_or(0);

    for i in 1..=msm1.nsat {
        msm1.prn.push(field(line, &cell_key("DF009", i)).unwrap_or(0));
        msm1.code_ind.push(field(line, &cell_key("DF010", i)).unwrap_or(0));
        msm1.remainder.push(field(line, &cell_key("DF011", i)).unwrap_or(0.0));
        msm1.phase_diff.push(field(line, &cell_key("DF012", i)).unwrap_or(0.0));
        msm1.lock.push(field(line, &cell_key("DF013", i)).unwrap_or(0));
        msm1.amb_ms.push(field(line, &cell_key("DF014", i)).unwrap_or(0));
        msm1.cnr.push(field(line, &cell_key("DF015", i)).unwrap_or(0.0));

        let j = msm1.prn.len() - 1;
        msm1.pseudorange.push(legacy_pseudorange(msm1.amb_ms[j], msm1.remainder[j]));
    }

    Ok(msm1)
}
