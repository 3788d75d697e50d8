use chrono::NaiveDate;

use crate::model::board::{Board, Deliverable, UNASSIGNED};
use crate::ops::reconcile::{WriteBack, delivery_line, owner_line};
use crate::parse::dates::{bucket_date, find_iso_date, iso, mid_quarter_date, parse_natural_date};

/// Error type for local board edits
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("deliverable not found: {0}")]
    NotFound(String),
    #[error("invalid date: {0}")]
    InvalidDate(String),
    #[error("unknown quarter: {0}")]
    UnknownQuarter(String),
    #[error("unknown lane: {0}")]
    UnknownLane(String),
}

/// Parse a date typed by the user. `tbd` and empty clear the date.
pub fn parse_date_input(text: &str) -> Result<Option<NaiveDate>, EditError> {
    let t = text.trim();
    if t.is_empty() || t.eq_ignore_ascii_case("tbd") {
        return Ok(None);
    }
    find_iso_date(t)
        .or_else(|| parse_natural_date(t))
        .map(Some)
        .ok_or_else(|| EditError::InvalidDate(t.to_string()))
}

fn find_mut<'a>(board: &'a mut Board, id: &str) -> Result<&'a mut Deliverable, EditError> {
    board
        .find_mut(id)
        .ok_or_else(|| EditError::NotFound(id.to_string()))
}

// ---------------------------------------------------------------------------
// Written-back fields
// ---------------------------------------------------------------------------

/// Set the owner. Returns the patch for the owner line when the card has one.
pub fn set_owner(board: &mut Board, id: &str, owner: &str) -> Result<Option<WriteBack>, EditError> {
    let d = find_mut(board, id)?;
    let owner = owner.trim();
    d.owner = if owner.is_empty() {
        UNASSIGNED.to_string()
    } else {
        owner.to_string()
    };
    Ok(d.owner_block_id.clone().map(|block_id| WriteBack::Patch {
        block_id,
        text: owner_line(&d.owner),
    }))
}

/// Set or clear the delivery date. The card stays in its column.
pub fn set_delivery_date(
    board: &mut Board,
    id: &str,
    date: Option<NaiveDate>,
) -> Result<Option<WriteBack>, EditError> {
    let d = find_mut(board, id)?;
    d.delivery_date = date.map(iso);
    Ok(d.delivery_date_block_id.clone().map(|block_id| WriteBack::Patch {
        block_id,
        text: delivery_line(date),
    }))
}

/// Move a card to another column (and optionally lane). The new date is
/// `date` if given, else the card's current date when it already falls in
/// the destination quarter, else the middle of that quarter. Returns the
/// date write-back.
pub fn relocate(
    board: &mut Board,
    id: &str,
    quarter_id: &str,
    lane_id: Option<&str>,
    date: Option<NaiveDate>,
) -> Result<Option<WriteBack>, EditError> {
    let quarter = board
        .quarter(quarter_id)
        .cloned()
        .ok_or_else(|| EditError::UnknownQuarter(quarter_id.to_string()))?;
    let lane = match lane_id {
        Some(l) => Some(
            board
                .lane(l)
                .cloned()
                .ok_or_else(|| EditError::UnknownLane(l.to_string()))?,
        ),
        None => None,
    };

    let d = find_mut(board, id)?;
    let current = d
        .delivery_date
        .as_deref()
        .and_then(find_iso_date)
        .filter(|c| bucket_date(*c, std::slice::from_ref(&quarter)).is_some());
    let new_date = date.or(current).or_else(|| mid_quarter_date(&quarter));

    d.quarter_id = quarter.id.clone();
    if let Some(lane) = lane {
        d.lane_id = lane.id;
        d.wiki_url = lane.wiki_url;
    }
    d.delivery_date = new_date.map(iso);

    Ok(new_date.map(|date| WriteBack::RelocateDate {
        deliverable_id: d.id.clone(),
        date,
        fallback_block_id: d.delivery_date_block_id.clone(),
    }))
}
