//! Four-constituency weighted tally.
//!
//! Each constituency's buckets are divided by that constituency's eligible
//! weight, giving shares in `[0, 1]`, and the four shares are summed per
//! bucket. The sums are compared as exact fractions: a bucket that equals
//! the other two combined is a tie, whatever the divisors.

use std::cmp::Ordering;

use primitive_types::U512;

use arbiter_types::{Amount, Constituency, Tally, VoteResult, VoteTallies};

/// Total weight each constituency could have cast at tally time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EligibleWeights {
    /// Token supply.
    pub tokenholders: Amount,
    /// Total tips recorded for the disputed query.
    pub users: Amount,
    /// Reporters currently holding the stake amount.
    pub reporters: Amount,
    pub team_multisig: Amount,
}

impl EligibleWeights {
    pub fn get(&self, constituency: Constituency) -> Amount {
        match constituency {
            Constituency::Tokenholders => self.tokenholders,
            Constituency::Users => self.users,
            Constituency::Reporters => self.reporters,
            Constituency::TeamMultisig => self.team_multisig,
        }
    }
}

/// Signed `numerator / denominator` with a positive denominator. Zero is
/// never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fraction {
    negative: bool,
    numerator: U512,
    denominator: U512,
}

impl Fraction {
    fn zero() -> Self {
        Self { negative: false, numerator: U512::zero(), denominator: U512::one() }
    }

    fn signed(negative: bool, numerator: U512, denominator: U512) -> Self {
        Self { negative: negative && !numerator.is_zero(), numerator, denominator }
    }

    /// `(favoured - opposed) / divisor`.
    fn margin(favoured: Amount, opposed: U512, divisor: Amount) -> Self {
        let favoured = U512::from(favoured);
        let (negative, numerator) = if favoured >= opposed {
            (false, favoured - opposed)
        } else {
            (true, opposed - favoured)
        };
        Self::signed(negative, numerator, U512::from(divisor))
    }

    fn neg(self) -> Self {
        Self::signed(!self.negative, self.numerator, self.denominator)
    }

    // Margin numerators stay within twice their u128 divisor, so a sum of
    // two stays far below 2^512.
    fn add(self, other: Self) -> Self {
        let left = self.numerator * other.denominator;
        let right = other.numerator * self.denominator;
        let denominator = self.denominator * other.denominator;
        if self.negative == other.negative {
            return Self::signed(self.negative, left + right, denominator);
        }
        if left >= right {
            Self::signed(self.negative, left - right, denominator)
        } else {
            Self::signed(other.negative, right - left, denominator)
        }
    }

    /// Compares magnitudes by whole part first, then by cross-multiplied
    /// remainders, which both stay below the denominators.
    fn cmp_magnitude(&self, other: &Self) -> Ordering {
        let whole = self.numerator / self.denominator;
        let other_whole = other.numerator / other.denominator;
        if whole != other_whole {
            return whole.cmp(&other_whole);
        }
        let rest = self.numerator % self.denominator;
        let other_rest = other.numerator % other.denominator;
        (rest * other.denominator).cmp(&(other_rest * self.denominator))
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self.negative, other.negative) {
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (false, false) => self.cmp_magnitude(other),
            (true, true) => other.cmp_magnitude(self),
        }
    }
}

/// Normalized margin of one bucket over the other two, per constituency.
fn constituency_margin(tally: &Tally, eligible: Amount, favoured: fn(&Tally) -> (Amount, Amount, Amount)) -> Fraction {
    // Eligibility can shrink between voting and tallying; never let a
    // constituency's share exceed one.
    let divisor = eligible.max(tally.total());
    if divisor == 0 {
        return Fraction::zero();
    }
    let (bucket, first, second) = favoured(tally);
    Fraction::margin(bucket, U512::from(first) + U512::from(second), divisor)
}

/// True when the favoured bucket's summed share strictly exceeds the other
/// two combined.
fn strictly_ahead(
    tallies: &VoteTallies,
    eligible: &EligibleWeights,
    favoured: fn(&Tally) -> (Amount, Amount, Amount),
) -> bool {
    let margin = |constituency| constituency_margin(tallies.get(constituency), eligible.get(constituency), favoured);
    let [tokenholders, users, reporters, multisig] = Constituency::ALL.map(margin);
    let left = tokenholders.add(users);
    let right = reporters.add(multisig);
    left.compare(&right.neg()) == Ordering::Greater
}

/// Strict majority over the other two buckets combined, otherwise invalid.
pub fn compute_result(tallies: &VoteTallies, eligible: &EligibleWeights) -> VoteResult {
    if strictly_ahead(tallies, eligible, |t| (t.does_support, t.against, t.invalid_query)) {
        VoteResult::Passed
    } else if strictly_ahead(tallies, eligible, |t| (t.against, t.does_support, t.invalid_query)) {
        VoteResult::Failed
    } else {
        VoteResult::Invalid
    }
}
