// normal.rs - Standard normal CDF and quantile function

const SQRT_2PI: f64 = 2.506_628_274_631_000_5;

/// Standard normal cumulative distribution function Φ(x).
///
/// Hart's double precision rational approximation (as arranged by West,
/// 2005); absolute error below 1e-14.
pub fn cdf(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }

    let x_abs = x.abs();
    let tail = if x_abs > 37.0 {
        0.0
    } else {
        let exponential = (-x_abs * x_abs / 2.0).exp();
        if x_abs < 7.071_067_811_865_47 {
            let mut num = 3.526_249_659_989_11e-2 * x_abs + 0.700_383_064_443_688;
            num = num * x_abs + 6.373_962_203_531_65;
            num = num * x_abs + 33.912_866_078_383;
            num = num * x_abs + 112.079_291_497_871;
            num = num * x_abs + 221.213_596_169_931;
            num = num * x_abs + 220.206_867_912_376;

            let mut den = 8.838_834_764_831_84e-2 * x_abs + 1.755_667_163_182_64;
            den = den * x_abs + 16.064_177_579_207;
            den = den * x_abs + 86.780_732_202_946_1;
            den = den * x_abs + 296.564_248_779_674;
            den = den * x_abs + 637.333_633_378_831;
            den = den * x_abs + 793.826_512_519_948;
            den = den * x_abs + 440.413_735_824_752;

            exponential * num / den
        } else {
            let mut build = x_abs + 0.65;
            build = x_abs + 4.0 / build;
            build = x_abs + 3.0 / build;
            build = x_abs + 2.0 / build;
            build = x_abs + 1.0 / build;
            exponential / build / SQRT_2PI
        }
    };

    if x > 0.0 {
        1.0 - tail
    } else {
        tail
    }
}

/// Inverse of the standard normal CDF, Φ⁻¹(p).
///
/// Acklam's rational approximation followed by one Halley step against
/// [`cdf`]. Returns -inf at 0, +inf at 1 and NaN outside [0, 1].
pub fn quantile(p: f64) -> f64 {
    if p.is_nan() || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }

    const A: [f64; 6] = [
        -3.969_683_028_665_376e1,
        2.209_460_984_245_205e2,
        -2.759_285_104_469_687e2,
        1.383_577_518_672_690e2,
        -3.066_479_806_614_716e1,
        2.506_628_277_459_239,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e1,
        1.615_858_368_580_409e2,
        -1.556_989_798_598_866e2,
        6.680_131_188_771_972e1,
        -1.328_068_155_288_572e1,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-3,
        -3.223_964_580_411_365e-1,
        -2.400_758_277_161_838,
        -2.549_732_539_343_734,
        4.374_664_141_464_968,
        2.938_163_982_698_783,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-3,
        3.224_671_290_700_398e-1,
        2.445_134_137_142_996,
        3.754_408_661_907_416,
    ];
    const P_LOW: f64 = 0.02425;

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    let x = if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    };

    if x == 0.0 {
        return x;
    }

    // Halley refinement
    let e = cdf(x) - p;
    let u = e * SQRT_2PI * (x * x / 2.0).exp();
    x - u / (1.0 + x * u / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdf_reference_values() {
        assert!((cdf(0.0) - 0.5).abs() < 1e-14);
        assert!((cdf(1.0) - 0.841_344_746_068_542_9).abs() < 1e-12);
        assert!((cdf(-1.959_963_984_540_054) - 0.025).abs() < 1e-12);
        assert!((cdf(8.0) - 1.0).abs() < 1e-14);
        assert_eq!(cdf(-40.0), 0.0);
    }

    #[test]
    fn test_cdf_symmetry() {
        for &x in &[0.1, 0.5, 1.3, 2.7, 5.0, 7.5] {
            assert!((cdf(x) + cdf(-x) - 1.0).abs() < 1e-13);
        }
    }

    #[test]
    fn test_quantile_reference_values() {
        assert_eq!(quantile(0.5), 0.0);
        assert!((quantile(0.975) - 1.959_963_984_540_054).abs() < 1e-9);
        assert!((quantile(0.025) + 1.959_963_984_540_054).abs() < 1e-9);
        assert!((quantile(0.841_344_746_068_542_9) - 1.0).abs() < 1e-9);
        assert!((quantile(1e-6) + 4.753_424_308_822_899).abs() < 1e-7);
    }

    #[test]
    fn test_quantile_edges() {
        assert_eq!(quantile(0.0), f64::NEG_INFINITY);
        assert_eq!(quantile(1.0), f64::INFINITY);
        assert!(quantile(1.5).is_nan());
        assert!(quantile(f64::NAN).is_nan());
    }

    #[test]
    fn test_round_trip() {
        for i in 1..100 {
            let p = i as f64 / 100.0;
            assert!((cdf(quantile(p)) - p).abs() < 1e-12);
        }
    }
}
