//! Host-side discovery of connected FreeWili boards.
//!
//! Discovery runs in two steps: the OS port list is filtered by USB vendor
//! and product ID, then every candidate is asked for its firmware banner to
//! learn which processor it is.

use log::{debug, info, warn};

use crate::board::FreeWili;
use crate::device::{DeviceDescriptor, ProcessorRole, is_freewili};
use crate::error::{Error, Result};
use crate::port::{Port, PortEnumerator};

/// Candidate descriptors from an enumerator, unclassified.
pub fn candidates<E: PortEnumerator>() -> Result<Vec<DeviceDescriptor>> {
    let found: Vec<DeviceDescriptor> = E::list_ports()?
        .iter()
        .filter(|info| is_freewili(info))
        .map(DeviceDescriptor::from_port_info)
        .collect();
    debug!("Found {} FreeWili candidate port(s)", found.len());
    Ok(found)
}

/// Query every board's banner and keep the ones matching `filter`.
///
/// A board whose banner query fails stays in the result as
/// [`AppInfo::Unknown`](crate::AppInfo::Unknown). Any role filter excludes
/// unclassified boards.
pub fn classify<P: Port>(
    boards: Vec<FreeWili<P>>,
    filter: Option<ProcessorRole>,
) -> Vec<FreeWili<P>> {
    boards
        .into_iter()
        .filter_map(|mut board| {
            match board.query_app_info() {
                Ok(app_info) => info!("{} is {app_info}", board.descriptor().port()),
                Err(e) => warn!(
                    "Could not identify {}: {e}",
                    board.descriptor().port()
                ),
            }
            let role = board.app_info().role();
            let keep = match filter {
                None => true,
                Some(wanted) => board.app_info().is_classified() && role == wanted,
            };
            keep.then_some(board)
        })
        .collect()
}

/// Pick the board at `index` (0-based).
pub fn select<T>(devices: Vec<T>, index: usize) -> Result<T> {
    let count = devices.len();
    if count == 0 {
        return Err(Error::DeviceNotFound);
    }
    devices
        .into_iter()
        .nth(index)
        .ok_or(Error::IndexOutOfRange { index, count })
}

#[cfg(feature = "native")]
mod native_impl {
    use super::{Result, candidates, classify, select};
    use crate::board::FreeWili;
    use crate::device::{DeviceDescriptor, ProcessorRole};
    use crate::port::{NativePort, NativePortEnumerator};

    /// FreeWili ports known to the OS, without opening them.
    pub fn list_candidates() -> Result<Vec<DeviceDescriptor>> {
        candidates::<NativePortEnumerator>()
    }

    /// Find and identify every connected FreeWili processor, optionally
    /// restricted to one role.
    pub fn enumerate(filter: Option<ProcessorRole>) -> Result<Vec<FreeWili<NativePort>>> {
        let boards = list_candidates()?
            .into_iter()
            .map(FreeWili::<NativePort>::from_descriptor)
            .collect();
        Ok(classify(boards, filter))
    }

    /// The connected processor at `index` (0-based, in enumeration order).
    pub fn find_device(index: usize) -> Result<FreeWili<NativePort>> {
        select(enumerate(None)?, index)
    }
}

#[cfg(feature = "native")]
pub use native_impl::{enumerate, find_device, list_candidates};
