//! Pitch algebra underlying the language: equal-tempered intervals and
//! frequency ratios, plus the frequency conversions anchored at concert
//! pitch (A4 = 440 Hz, key 69 of the 12-tone scale).

/// Frequency of the reference note, in Hz.
pub const REFERENCE_FREQ: f64 = 440.0;

/// Key number of the reference note in 12-tone equal temperament.
pub const REFERENCE_KEY: f64 = 69.0;

/// Greatest common divisor of two non-negative integers.
pub fn gcd(a: i64, b: i64) -> i64 {
    let mut a = a.abs();
    let mut b = b.abs();
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Two integers are coprime iff their greatest common divisor is one.
pub fn coprime(a: i64, b: i64) -> bool {
    // both even can never be coprime
    if (a | b) & 1 == 0 {
        return false;
    }
    gcd(a, b) == 1
}

/// Euclidean modulo: the result always has the sign of `m`,
/// so `modulo(-1.0, 12.0)` is `11.0`.
pub fn modulo(a: f64, m: f64) -> f64 {
    let r = a % m;
    if r != 0.0 && (r < 0.0) != (m < 0.0) {
        r + m
    } else {
        r
    }
}

/// A frequency ratio `n:d` between two pitches.
///
/// Both components are positive. They are usually integral, but interval
/// algebra (scaling an interval, or converting an equal-tempered interval
/// to a ratio) may produce fractional components. Ratios are deliberately
/// *not* normalized: `6:4` stays `6:4` so that compound ratios such as
/// `4:5:6:7` keep their common fundamental.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ratio {
    pub n: f64,
    pub d: f64,
}

impl Ratio {
    pub fn new(n: f64, d: f64) -> Ratio {
        Ratio { n, d }
    }

    /// The ratio as a plain number, `n / d`.
    pub fn decimal(self) -> f64 {
        self.n / self.d
    }

    /// The width of the interval in cents.
    pub fn cents(self) -> f64 {
        1200.0 * self.decimal().log2()
    }

    /// The descending version of this interval, `d:n`.
    pub fn recip(self) -> Ratio {
        Ratio {
            n: self.d,
            d: self.n,
        }
    }

    /// Stack two ratio intervals on top of each other
    /// (multiplication of the underlying fractions).
    ///
    /// # Examples
    ///
    /// ```
    /// use xen::pitch::Ratio;
    ///
    /// assert_eq!(Ratio::new(5.0, 4.0).stack(Ratio::new(3.0, 2.0)), Ratio::new(15.0, 8.0));
    /// ```
    pub fn stack(self, other: Ratio) -> Ratio {
        Ratio {
            n: self.n * other.n,
            d: self.d * other.d,
        }
    }

    /// Stretch the interval by a factor: `scale(2.0)` stacks the interval
    /// on itself, `scale(0.5)` splits it in half.
    pub fn scale(self, k: f64) -> Ratio {
        Ratio {
            n: self.n.powf(k),
            d: self.d.powf(k),
        }
    }
}

/// An equal-tempered interval: `steps` steps of a `base`-division octave.
///
/// The step count may be fractional (conversions from ratios and cents
/// rarely land on a whole step); the base must be positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Et {
    pub steps: f64,
    pub base: f64,
}

impl Et {
    pub fn new(steps: f64, base: f64) -> Et {
        Et { steps, base }
    }

    pub fn from_cents(cents: f64, base: f64) -> Et {
        Et {
            steps: cents * base / 1200.0,
            base,
        }
    }

    /// The width of the interval in cents.
    pub fn cents(self) -> f64 {
        self.steps * 1200.0 / self.base
    }

    /// The same interval expressed against a different octave division.
    ///
    /// # Examples
    ///
    /// ```
    /// use xen::pitch::Et;
    ///
    /// // an octave is an octave in any division
    /// assert_eq!(Et::new(19.0, 19.0).rebase(12.0), Et::new(12.0, 12.0));
    /// ```
    pub fn rebase(self, base: f64) -> Et {
        Et::from_cents(self.cents(), base)
    }

    /// The interval as a (decimal) frequency ratio against one.
    pub fn as_ratio(self) -> Ratio {
        Ratio::new((self.steps / self.base).exp2(), 1.0)
    }
}

/// Frequency of step `steps` in a `base`-division equal temperament,
/// anchored so that key 69 of the 12-tone scale is 440 Hz.
pub fn et_to_freq(steps: f64, base: f64) -> f64 {
    REFERENCE_FREQ * ((steps - REFERENCE_KEY * base / 12.0) / base).exp2()
}

/// Inverse of [`et_to_freq`]: the (fractional) step a frequency falls on.
pub fn freq_to_et(hz: f64, base: f64) -> f64 {
    base * (hz / REFERENCE_FREQ).log2() + REFERENCE_KEY * base / 12.0
}

/// The frequency lying the given interval above `hz`.
pub fn note_above(hz: f64, cents: f64) -> f64 {
    hz * (cents / 1200.0).exp2()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_gcd_coprime() {
        assert_eq!(gcd(12, 18), 6);
        assert_eq!(gcd(7, 0), 7);
        for n in 1..40i64 {
            for d in 1..40i64 {
                assert_eq!(coprime(n, d), gcd(n, d) == 1, "coprime({}, {})", n, d);
            }
        }
    }

    #[test]
    fn test_modulo() {
        assert_eq!(modulo(7.0, 12.0), 7.0);
        assert_eq!(modulo(-1.0, 12.0), 11.0);
        assert_eq!(modulo(24.0, 12.0), 0.0);
    }

    #[test]
    fn test_reference_tuning() {
        assert!((et_to_freq(69.0, 12.0) - 440.0).abs() < 1e-9);
        assert!((et_to_freq(57.0, 12.0) - 220.0).abs() < 1e-9);
        // middle C
        assert!((et_to_freq(60.0, 12.0) - 261.625).abs() < 0.01);
    }

    #[test]
    fn test_freq_roundtrip() {
        for &base in &[5.0, 12.0, 19.0, 31.0] {
            for steps in 0..60 {
                let steps = f64::from(steps);
                let back = freq_to_et(et_to_freq(steps, base), base);
                assert!((back - steps).abs() < 1e-9, "{} steps of {}", steps, base);
            }
        }
    }

    #[test]
    fn test_ratio_cents() {
        assert!((Ratio::new(2.0, 1.0).cents() - 1200.0).abs() < 1e-9);
        assert!((Ratio::new(3.0, 2.0).cents() - 701.955).abs() < 0.001);
        assert_eq!(Et::new(19.0, 19.0).cents(), 1200.0);
    }

    #[test]
    fn test_ratio_not_normalized() {
        let r = Ratio::new(6.0, 4.0);
        assert_eq!(r.n, 6.0);
        assert_eq!(r.d, 4.0);
        assert!((r.decimal() - 1.5).abs() < 1e-12);
    }
}
