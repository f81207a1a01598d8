//! Splicing a projection onto the end of its historical run.

use crate::error::{IsmError, IsmResult};
use crate::series::Series;

/// `historical - historical.last`; the result ends at zero.
pub fn rebase_historical(historical: &Series) -> IsmResult<Series> {
    let last = historical.last().ok_or(IsmError::EmptySeries("historical"))?;
    Ok(historical.shifted(-last))
}

/// `projection - projection.first + rebased.last`, where `rebased` is the
/// already rebased historical run.
pub fn rebase_projection(projection: &Series, rebased_historical: &Series) -> IsmResult<Series> {
    let first = projection.first().ok_or(IsmError::EmptySeries("projection"))?;
    let join = rebased_historical.last().ok_or(IsmError::EmptySeries("historical"))?;
    Ok(projection.shifted(join - first))
}

/// Rebases both runs of one model, historical first.
pub fn splice(historical: &Series, projection: &Series) -> IsmResult<(Series, Series)> {
    let h = rebase_historical(historical)?;
    let p = rebase_projection(projection, &h)?;
    Ok((h, p))
}
