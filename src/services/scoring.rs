//! Deal scoring from a structured game outcome.

use indexmap::IndexMap;

use crate::{
    dao::{
        models::{Chelem, GameDetails, PetitAuBout, PoigneeSize},
        settings::{MiserySettings, ScoreConfig},
    },
    error::ServiceError,
};

/// Points exchanged per opponent for each declared misère.
pub const MISERE_POINTS: i32 = 10;
/// Card points in a full deck.
pub const TOTAL_POINTS: f64 = 91.0;

/// Card points the taker needs for the given number of bouts.
pub fn target_points(bouts: u8) -> f64 {
    match bouts {
        0 => 56.0,
        1 => 51.0,
        2 => 41.0,
        _ => 36.0,
    }
}

/// Signed unit score from the taker's point of view.
///
/// Fails when the configured bonuses push the score outside the `i32` range.
pub fn unit_score(details: &GameDetails, config: &ScoreConfig) -> Result<i32, ServiceError> {
    let multiplier = config.multipliers.for_contract(details.contract);
    let diff = details.taker_points - target_points(details.bouts);
    let sign = if diff >= 0.0 { 1 } else { -1 };

    let mut score = checked(
        config
            .base
            .checked_add(diff.abs().round() as i32)
            .and_then(|points| points.checked_mul(multiplier))
            .and_then(|points| points.checked_mul(sign)),
    )?;

    let petit_au_bout = checked(config.petit_au_bout.checked_mul(multiplier))?;
    score = checked(match details.petit_au_bout {
        PetitAuBout::None => Some(score),
        PetitAuBout::Preneur => score.checked_add(petit_au_bout),
        PetitAuBout::Defense => score.checked_sub(petit_au_bout),
    })?;

    let poignee = match details.poignee.size() {
        None => 0,
        Some(PoigneeSize::Simple) => config.poignee.simple,
        Some(PoigneeSize::Double) => config.poignee.double,
        Some(PoigneeSize::Triple) => config.poignee.triple,
    };
    score = checked(
        poignee
            .checked_mul(sign)
            .and_then(|bonus| score.checked_add(bonus)),
    )?;

    let chelem = match details.chelem {
        Chelem::None => 0,
        Chelem::NonAnnonceReussi => config.chelem.non_annonce_reussi,
        Chelem::AnnonceReussi => config.chelem.annonce_reussi,
        Chelem::AnnonceRate => config.chelem.annonce_rate,
    };
    checked(score.checked_add(chelem))
}

fn checked(value: Option<i32>) -> Result<i32, ServiceError> {
    value.ok_or_else(|| {
        ServiceError::InvalidInput("score out of range for the current score configuration".into())
    })
}

/// Compute every participant's points for one deal.
///
/// The returned map follows participant order and always sums to zero.
pub fn score_deal(
    details: &GameDetails,
    participants: &[String],
    config: &ScoreConfig,
    misery: MiserySettings,
) -> Result<IndexMap<String, i32>, ServiceError> {
    validate(details, participants)?;

    let partner = details
        .called
        .as_deref()
        .filter(|called| !called.is_empty() && *called != details.taker);
    let defenders = participants
        .iter()
        .filter(|name| **name != details.taker && Some(name.as_str()) != partner)
        .count() as i32;

    let unit = unit_score(details, config)?;
    let taker_share = match partner {
        Some(_) => unit.checked_mul(defenders - 1),
        None => unit.checked_mul(defenders),
    };
    let taker_share = checked(taker_share)?;
    let defender_share = checked(unit.checked_neg())?;

    let mut scores = participants
        .iter()
        .map(|name| {
            let points = if *name == details.taker {
                taker_share
            } else if Some(name.as_str()) == partner {
                unit
            } else {
                defender_share
            };
            (name.clone(), points)
        })
        .collect::<IndexMap<_, _>>();

    if misery.atout {
        apply_misere(&mut scores, &details.miseres)?;
    }
    if misery.tete {
        apply_misere(&mut scores, &details.miseres_tete)?;
    }

    Ok(scores)
}

fn validate(details: &GameDetails, participants: &[String]) -> Result<(), ServiceError> {
    let known = |name: &str| participants.iter().any(|p| p == name);

    if details.bouts > 3 {
        return Err(ServiceError::InvalidInput(format!(
            "bouts must be between 0 and 3, got {}",
            details.bouts
        )));
    }
    if !details.taker_points.is_finite() || !(0.0..=TOTAL_POINTS).contains(&details.taker_points)
    {
        return Err(ServiceError::InvalidInput(format!(
            "taker points must be between 0 and {TOTAL_POINTS}"
        )));
    }
    if !known(&details.taker) {
        return Err(ServiceError::InvalidInput(format!(
            "taker `{}` is not a participant",
            details.taker
        )));
    }
    if let Some(called) = details.called.as_deref().filter(|c| !c.is_empty()) {
        if !known(called) {
            return Err(ServiceError::InvalidInput(format!(
                "called partner `{called}` is not a participant"
            )));
        }
    }
    if let Some(declarer) = details
        .miseres
        .iter()
        .chain(details.miseres_tete.iter())
        .find(|name| !known(name))
    {
        return Err(ServiceError::InvalidInput(format!(
            "misère declarer `{declarer}` is not a participant"
        )));
    }
    Ok(())
}

fn apply_misere(
    scores: &mut IndexMap<String, i32>,
    declarers: &[String],
) -> Result<(), ServiceError> {
    let gain = MISERE_POINTS * (scores.len() as i32 - 1);
    for declarer in declarers {
        for (name, points) in scores.iter_mut() {
            *points = if name == declarer {
                checked(points.checked_add(gain))?
            } else {
                checked(points.checked_sub(MISERE_POINTS))?
            };
        }
    }
    Ok(())
}
