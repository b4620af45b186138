//! Exact conversion between `f64` magnitudes and positional digits.
//!
//! Every finite `f64` is a dyadic rational, so its integral digits can be
//! produced exactly. Fraction digits stop as soon as they pin the value down
//! among its neighbours. Parsing builds the exact ratio of the digits and
//! rounds it once, to nearest with ties to even.

use std::cmp::Ordering;

use super::DIGITS;

/// Longest run of significant integral digits that can still be finite in
/// base 2. Anything longer overflows in every base.
const MAX_INTEGRAL_DIGITS: usize = 1100;
/// Fraction digits past this point only decide ties and are folded into a
/// sticky bit.
const MAX_FRACTION_DIGITS: usize = 1100;

/// Unsigned big integer: little-endian 32-bit limbs, no trailing zero limbs.
#[derive(Clone, Debug, PartialEq, Eq)]
struct BigUint(Vec<u32>);

impl BigUint {
    fn zero() -> Self {
        Self(Vec::new())
    }

    fn from_u64(value: u64) -> Self {
        let mut n = Self(vec![value as u32, (value >> 32) as u32]);
        n.trim();
        n
    }

    fn pow2(bits: usize) -> Self {
        let mut limbs = vec![0; bits / 32 + 1];
        limbs[bits / 32] = 1 << (bits % 32);
        Self(limbs)
    }

    fn trim(&mut self) {
        while self.0.last() == Some(&0) {
            self.0.pop();
        }
    }

    fn is_zero(&self) -> bool {
        self.0.is_empty()
    }

    fn bit_len(&self) -> usize {
        match self.0.last() {
            Some(top) => self.0.len() * 32 - top.leading_zeros() as usize,
            None => 0,
        }
    }

    fn low_u32(&self) -> u32 {
        self.0.first().copied().unwrap_or(0)
    }

    fn mul_small(&mut self, factor: u32) {
        let mut carry = 0u64;
        for limb in &mut self.0 {
            let wide = u64::from(*limb) * u64::from(factor) + carry;
            *limb = wide as u32;
            carry = wide >> 32;
        }
        if carry > 0 {
            self.0.push(carry as u32);
        }
        self.trim();
    }

    fn add_small(&mut self, addend: u32) {
        let mut carry = u64::from(addend);
        for limb in &mut self.0 {
            if carry == 0 {
                break;
            }
            let wide = u64::from(*limb) + carry;
            *limb = wide as u32;
            carry = wide >> 32;
        }
        if carry > 0 {
            self.0.push(carry as u32);
        }
    }

    /// Divide in place and return the remainder.
    fn divrem_small(&mut self, divisor: u32) -> u32 {
        let divisor = u64::from(divisor);
        let mut rem = 0u64;
        for limb in self.0.iter_mut().rev() {
            let wide = (rem << 32) | u64::from(*limb);
            *limb = (wide / divisor) as u32;
            rem = wide % divisor;
        }
        self.trim();
        rem as u32
    }

    fn add(&self, other: &Self) -> Self {
        let (long, short) = if self.0.len() >= other.0.len() {
            (self, other)
        } else {
            (other, self)
        };
        let mut limbs = Vec::with_capacity(long.0.len() + 1);
        let mut carry = 0u64;
        for (i, limb) in long.0.iter().enumerate() {
            let wide = u64::from(*limb) + u64::from(short.0.get(i).copied().unwrap_or(0)) + carry;
            limbs.push(wide as u32);
            carry = wide >> 32;
        }
        if carry > 0 {
            limbs.push(carry as u32);
        }
        Self(limbs)
    }

    /// `self -= other`, where `other <= self`.
    fn sub_assign(&mut self, other: &Self) {
        let mut borrow = 0i64;
        for (i, limb) in self.0.iter_mut().enumerate() {
            let wide = i64::from(*limb) - i64::from(other.0.get(i).copied().unwrap_or(0)) - borrow;
            if wide < 0 {
                *limb = (wide + (1i64 << 32)) as u32;
                borrow = 1;
            } else {
                *limb = wide as u32;
                borrow = 0;
            }
        }
        self.trim();
    }

    fn shl(&self, bits: usize) -> Self {
        if self.is_zero() {
            return Self::zero();
        }
        let shift = (bits % 32) as u32;
        let mut limbs = vec![0u32; bits / 32];
        if shift == 0 {
            limbs.extend_from_slice(&self.0);
        } else {
            let mut carry = 0u32;
            for limb in &self.0 {
                limbs.push((limb << shift) | carry);
                carry = limb >> (32 - shift);
            }
            if carry > 0 {
                limbs.push(carry);
            }
        }
        Self(limbs)
    }

    /// `(self >> bits, self mod 2^bits)`
    fn split_at_bit(&self, bits: usize) -> (Self, Self) {
        let whole = bits / 32;
        let shift = (bits % 32) as u32;

        let mut low: Vec<u32> = self.0.iter().take(whole).copied().collect();
        if shift > 0 {
            if let Some(limb) = self.0.get(whole) {
                low.push(limb & ((1u32 << shift) - 1));
            }
        }

        let upper = self.0.get(whole..).unwrap_or(&[]);
        let high = upper
            .iter()
            .enumerate()
            .map(|(i, limb)| {
                if shift == 0 {
                    *limb
                } else {
                    let next = upper.get(i + 1).copied().unwrap_or(0);
                    (limb >> shift) | (next << (32 - shift))
                }
            })
            .collect();

        let (mut high, mut low) = (Self(high), Self(low));
        high.trim();
        low.trim();
        (high, low)
    }
}

impl Ord for BigUint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.iter().rev().cmp(other.0.iter().rev()))
    }
}

impl PartialOrd for BigUint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// `|value| = mantissa * 2^exponent` with the hidden bit restored.
fn decompose(value: f64) -> (u64, i32) {
    let bits = value.abs().to_bits();
    let biased = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1 << 52) - 1);
    if biased == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1 << 52), biased - 1075)
    }
}

/// Digits of a finite, non-zero magnitude in `base`, without a sign.
pub(super) fn format_magnitude(value: f64, base: u32) -> String {
    let (mantissa, exponent) = decompose(value);

    let mut integral = if exponent >= 0 {
        BigUint::from_u64(mantissa).shl(exponent as usize)
    } else if exponent > -64 {
        BigUint::from_u64(mantissa >> -exponent)
    } else {
        BigUint::zero()
    };
    let fraction = if exponent < 0 {
        fraction_digits(mantissa, exponent, base, &mut integral)
    } else {
        Vec::new()
    };

    let alphabet = DIGITS.as_bytes();
    let mut reversed = Vec::new();
    loop {
        reversed.push(char::from(alphabet[integral.divrem_small(base) as usize]));
        if integral.is_zero() {
            break;
        }
    }

    let mut text: String = reversed.into_iter().rev().collect();
    if !fraction.is_empty() {
        text.push('.');
        text.extend(fraction.iter().map(|d| char::from(alphabet[*d as usize])));
    }
    text
}

/// Fraction digits of `mantissa * 2^exponent`, produced until the remainder
/// is within half the gap to the nearest neighbouring `f64`. A final round up
/// may carry into `integral`.
fn fraction_digits(mantissa: u64, exponent: i32, base: u32, integral: &mut BigUint) -> Vec<u32> {
    let fraction_bits = (-exponent) as usize;
    let bits = if fraction_bits >= 64 {
        mantissa
    } else {
        mantissa & ((1u64 << fraction_bits) - 1)
    };

    // fixed point with `scale` bits after the point; the two extra bits make
    // half and quarter ulps whole numbers
    let scale = fraction_bits + 2;
    let one = BigUint::pow2(scale);
    let half = BigUint::pow2(scale - 1);
    let mut fraction = BigUint::from_u64(bits).shl(2);
    // below a power of two the neighbour is only half an ulp away
    let narrow = mantissa == 1 << 52 && exponent > -1074;
    let mut delta = BigUint::from_u64(if narrow { 1 } else { 2 });

    let mut digits = Vec::new();
    if fraction < delta {
        return digits;
    }
    loop {
        fraction.mul_small(base);
        delta.mul_small(base);
        let (digit, rest) = fraction.split_at_bit(scale);
        let digit = digit.low_u32();
        fraction = rest;
        digits.push(digit);

        let past_half = fraction > half || (fraction == half && digit % 2 == 1);
        if past_half && fraction.add(&delta) > one {
            round_up(&mut digits, base, integral);
            break;
        }
        if fraction < delta {
            break;
        }
    }
    digits
}

fn round_up(digits: &mut Vec<u32>, base: u32, integral: &mut BigUint) {
    while let Some(last) = digits.pop() {
        if last + 1 < base {
            digits.push(last + 1);
            return;
        }
    }
    integral.add_small(1);
}

/// Value of `integral.fraction` in `base`, rounded to the nearest `f64`.
///
/// Digits must already be below `base`. Returns infinity when the value is
/// too large for an `f64`.
pub(super) fn parse_magnitude(integral: &[u32], fraction: &[u32], base: u32) -> f64 {
    let first = integral
        .iter()
        .position(|d| *d != 0)
        .unwrap_or(integral.len());
    let integral = &integral[first..];
    if integral.len() > MAX_INTEGRAL_DIGITS {
        return f64::INFINITY;
    }
    let (fraction, tail) = fraction.split_at(fraction.len().min(MAX_FRACTION_DIGITS));

    let mut numerator = BigUint::zero();
    for digit in integral.iter().chain(fraction) {
        numerator.mul_small(base);
        numerator.add_small(*digit);
    }
    let mut denominator = BigUint::from_u64(1);
    for _ in fraction {
        denominator.mul_small(base);
    }
    let inexact = tail.iter().any(|d| *d != 0);
    ratio_to_f64(&numerator, &denominator, inexact)
}

/// `numerator / denominator` rounded to nearest, ties to even. `inexact`
/// marks a value slightly above the ratio.
fn ratio_to_f64(numerator: &BigUint, denominator: &BigUint, inexact: bool) -> f64 {
    if numerator.is_zero() {
        return 0.0;
    }

    // scale so the quotient lands in [2^65, 2^67): 53 bits plus room to round
    let shift = 66 - (numerator.bit_len() as i64 - denominator.bit_len() as i64);
    let (mut rest, divisor) = if shift >= 0 {
        (numerator.shl(shift as usize), denominator.clone())
    } else {
        (numerator.clone(), denominator.shl((-shift) as usize))
    };

    let mut quotient = 0u128;
    for bit in (0..68usize).rev() {
        let step = divisor.shl(bit);
        if rest >= step {
            rest.sub_assign(&step);
            quotient |= 1u128 << bit;
        }
    }
    round_to_f64(quotient, inexact || !rest.is_zero(), -shift)
}

/// `(quotient + sticky) * 2^exponent` rounded to nearest, ties to even, where
/// `sticky` is some amount strictly between 0 and 1.
fn round_to_f64(quotient: u128, sticky: bool, exponent: i64) -> f64 {
    if quotient == 0 {
        return 0.0;
    }
    let bits = i64::from(128 - quotient.leading_zeros());
    let top = bits - 1 + exponent;
    if top > 1023 {
        return f64::INFINITY;
    }

    // significant bits an f64 holds at this magnitude, fewer once subnormal
    let precision = if top >= -1022 { 53 } else { 53 - (-1022 - top) };
    if precision <= 0 {
        // only values above half the smallest subnormal survive
        let above_half = precision == 0 && (quotient.count_ones() > 1 || sticky);
        return if above_half { f64::from_bits(1) } else { 0.0 };
    }

    let drop = bits - precision;
    if drop <= 0 {
        return scale_pow2(quotient as f64, exponent);
    }
    let drop = drop as u32;
    let mut kept = quotient >> drop;
    let rest = quotient & ((1u128 << drop) - 1);
    let half = 1u128 << (drop - 1);
    if rest > half || (rest == half && (sticky || kept & 1 == 1)) {
        kept += 1;
    }
    scale_pow2(kept as f64, exponent + i64::from(drop))
}

/// `value * 2^exponent` in steps that stay exact for representable results.
fn scale_pow2(mut value: f64, mut exponent: i64) -> f64 {
    while exponent > 1000 {
        value *= 2f64.powi(1000);
        exponent -= 1000;
    }
    while exponent < -1000 {
        value *= 2f64.powi(-1000);
        exponent += 1000;
    }
    value * 2f64.powi(exponent as i32)
}
