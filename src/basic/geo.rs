use crate::basic::var::{D2R, R2D};

/// earth semimajor axis (WGS84) (m)
pub const RE_WGS84: f64 = 6378137.0;
/// earth flattening (WGS84)
pub const FE_WGS84: f64 = 1.0 / 298.257223563;
/// semi-minor axis (m)
pub const RB_WGS84: f64 = RE_WGS84 * (1.0 - FE_WGS84);
/// first eccentricity squared
pub const E2_WGS84: f64 = 2.0 * FE_WGS84 - FE_WGS84 * FE_WGS84;

/// transform ecef position to geodetic latitude/longitude/height by
/// Bowring's closed form
///
/// Returns `[lat (deg), lon (deg), alt (m)]` on the WGS-84 ellipsoid.
/// The origin maps to `[0, 0, -RE_WGS84]`.
pub fn ecef2geodetic(r: &[f64; 3]) -> [f64; 3] {
    let (x, y, z) = (r[0], r[1], r[2]);
    let ep2 = (RE_WGS84 * RE_WGS84 - RB_WGS84 * RB_WGS84) / (RB_WGS84 * RB_WGS84);

    let lon = y.atan2(x);
    let p = (x * x + y * y).sqrt();

    if p == 0.0 && z == 0.0 {
        return [0.0, 0.0, -RE_WGS84];
    }

    let theta = (z * RE_WGS84).atan2(p * RB_WGS84);
    let (st, ct) = (theta.sin(), theta.cos());
    let lat = (z + ep2 * RB_WGS84 * st * st * st).atan2(p - E2_WGS84 * RE_WGS84 * ct * ct * ct);

    let sl = lat.sin();
    let n = RE_WGS84 / (1.0 - E2_WGS84 * sl * sl).sqrt();

    // p/cos(lat) degenerates on the polar axis; there the height is exact
    let alt = if p > 1E-6 {
        p / lat.cos() - n
    } else {
        z.abs() - RB_WGS84
    };

    [lat * R2D, lon * R2D, alt]
}

/// transform geodetic latitude/longitude/height to ecef position
pub fn geodetic2ecef(pos: &[f64; 3]) -> [f64; 3] {
    let lat = pos[0] * D2R;
    let lon = pos[1] * D2R;
    let h = pos[2];

    let sl = lat.sin();
    let n = RE_WGS84 / (1.0 - E2_WGS84 * sl * sl).sqrt();

    [
        (n + h) * lat.cos() * lon.cos(),
        (n + h) * lat.cos() * lon.sin(),
        (n * (1.0 - E2_WGS84) + h) * sl,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::func::norm;

    #[test]
    fn test_equator_point() {
        let lla = ecef2geodetic(&[6378137.0, 0.0, 0.0]);
        assert!(lla[0].abs() < 1E-6);
        assert!(lla[1].abs() < 1E-6);
        assert!(lla[2].abs() < 1E-6);
    }

    #[test]
    fn test_pole_point() {
        let lla = ecef2geodetic(&[0.0, 0.0, 6356752.3142]);
        assert!((lla[0] - 90.0).abs() < 1E-6);
        assert!(lla[1].abs() < 1E-6);
        assert!(lla[2].abs() < 1E-3);
    }

    #[test]
    fn test_origin() {
        let lla = ecef2geodetic(&[0.0, 0.0, 0.0]);
        assert_eq!(lla, [0.0, 0.0, -RE_WGS84]);
    }

    #[test]
    fn test_roundtrip_within_1mm() {
        for lat in (-89..=89).step_by(7) {
            for lon in (-180..180).step_by(33) {
                for &h in &[-10000.0, -120.0, 0.0, 300.0, 10000.0] {
                    let lla = [lat as f64, lon as f64, h];
                    let xyz = geodetic2ecef(&lla);
                    let back = geodetic2ecef(&ecef2geodetic(&xyz));
                    let d = [xyz[0] - back[0], xyz[1] - back[1], xyz[2] - back[2]];
                    assert!(
                        norm(&d) < 1E-3,
                        "roundtrip error {} m at {:?}",
                        norm(&d),
                        lla
                    );
                }
            }
        }
    }
}
