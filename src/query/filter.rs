use std::str::FromStr;

use super::{GameFilter, Page, SortBy};

impl GameFilter {
    /// Parse listing options from raw query-string pairs.
    ///
    /// `genreIds` and `platformIds` accept repeated keys, comma-separated values, or both.
    /// For every other key the last occurrence wins. Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns a descriptive message for non-numeric or negative numbers, an unknown `sortBy`, or
    /// an `ownedByMe` that is neither `true` nor `false`.
    pub fn from_query_pairs(pairs: &[(String, String)]) -> Result<Self, String> {
        let mut filter = Self::default();
        let mut start: Option<u64> = None;
        let mut count: Option<u64> = None;

        for (key, value) in pairs {
            match key.as_str() {
                "q" => filter.q = Some(value.clone()).filter(|q| !q.is_empty()),
                "genreIds" => filter.genre_ids.extend(parse_id_list(key, value)?),
                "platformIds" => filter.platform_ids.extend(parse_id_list(key, value)?),
                "creatorId" => filter.creator_id = Some(parse_id(key, value)?),
                "ownerId" => filter.owner_id = Some(parse_id(key, value)?),
                "reviewerId" => filter.reviewer_id = Some(parse_id(key, value)?),
                "price" => filter.max_price = Some(parse_id(key, value)?),
                "ownedByMe" => {
                    filter.owned_by_me = match value.as_str() {
                        "true" => true,
                        "false" => false,
                        _ => return Err("ownedByMe must be true or false.".to_string()),
                    }
                }
                "sortBy" => filter.sort_by = SortBy::from_str(value)?,
                "startIndex" => start = Some(parse_index(key, value)?),
                "count" => count = Some(parse_index(key, value)?),
                _ => {}
            }
        }

        if let (Some(start), Some(count)) = (start, count) {
            filter.page = Some(Page { start, count });
        }
        Ok(filter)
    }
}

fn parse_id(key: &str, value: &str) -> Result<i32, String> {
    value
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|n| *n >= 0)
        .ok_or_else(|| format!("{key} must be a non-negative integer."))
}

fn parse_id_list(key: &str, value: &str) -> Result<Vec<i32>, String> {
    value
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| parse_id(key, part))
        .collect()
}

/// Offsets and limits are bound as signed 64-bit parameters, so anything past `i64::MAX` is
/// rejected here.
fn parse_index(key: &str, value: &str) -> Result<u64, String> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|n| u64::try_from(n).ok())
        .ok_or_else(|| format!("{key} must be a non-negative integer."))
}
