//! Dense 1-based position bookkeeping for ordered collections.
//!
//! Callers load the current order inside a transaction, edit it in memory
//! and persist only the rows whose position changed.

use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Reject positions outside `1..=len`.
pub fn check_position(position: i32, len: usize) -> AppResult<usize> {
    if position < 1 || position as usize > len {
        return Err(AppError::InvalidInput(format!(
            "position must be between 1 and {}",
            len
        )));
    }
    Ok(position as usize)
}

/// Move the item with `id` so that it ends up at 1-based `position`.
pub fn move_to(order: &mut Vec<Uuid>, id: Uuid, position: i32) -> AppResult<()> {
    let target = check_position(position, order.len())?;
    let from = order
        .iter()
        .position(|item| *item == id)
        .ok_or_else(|| AppError::NotFound(format!("Item {}", id)))?;
    let item = order.remove(from);
    order.insert(target - 1, item);
    Ok(())
}

/// Insert `id` at 1-based `position`, or append when `None`.
pub fn insert_at(order: &mut Vec<Uuid>, id: Uuid, position: Option<i32>) -> AppResult<()> {
    match position {
        None => order.push(id),
        Some(position) => {
            let target = check_position(position, order.len() + 1)?;
            order.insert(target - 1, id);
        }
    }
    Ok(())
}

/// Rows whose stored position differs from their index in `order`.
///
/// `current` pairs each id with its stored position. Ids absent from
/// `current` are reported too.
pub fn position_changes(current: &[(Uuid, i32)], order: &[Uuid]) -> Vec<(Uuid, i32)> {
    order
        .iter()
        .enumerate()
        .filter_map(|(idx, id)| {
            let wanted = idx as i32 + 1;
            let stored = current.iter().find(|(cid, _)| cid == id).map(|(_, p)| *p);
            (stored != Some(wanted)).then_some((*id, wanted))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::now_v7()).collect()
    }

    fn numbered(order: &[Uuid]) -> Vec<(Uuid, i32)> {
        order
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, i as i32 + 1))
            .collect()
    }

    #[test]
    fn test_remove_renumbers_tail_only() {
        let items = ids(4);
        let current = numbered(&items);
        let mut order = items.clone();
        order.remove(1);

        let changes = position_changes(&current, &order);

        assert_eq!(changes, vec![(items[2], 2), (items[3], 3)]);
    }

    #[test]
    fn test_move_down_and_up() {
        let items = ids(4);
        let mut order = items.clone();

        move_to(&mut order, items[0], 3).unwrap();
        assert_eq!(order, vec![items[1], items[2], items[0], items[3]]);

        move_to(&mut order, items[3], 1).unwrap();
        assert_eq!(order, vec![items[3], items[1], items[2], items[0]]);
    }

    #[test]
    fn test_move_rejects_out_of_range() {
        let items = ids(2);
        let mut order = items.clone();
        assert!(matches!(
            move_to(&mut order, items[0], 3),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            move_to(&mut order, items[0], 0),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            move_to(&mut order, Uuid::now_v7(), 1),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_insert_at_front_shifts_everything() {
        let items = ids(2);
        let current = numbered(&items);
        let new = Uuid::now_v7();
        let mut order = items.clone();

        insert_at(&mut order, new, Some(1)).unwrap();

        let changes = position_changes(&current, &order);
        assert_eq!(changes, vec![(new, 1), (items[0], 2), (items[1], 3)]);
    }

    #[test]
    fn test_insert_appends_by_default() {
        let items = ids(2);
        let new = Uuid::now_v7();
        let mut order = items.clone();

        insert_at(&mut order, new, None).unwrap();
        assert_eq!(order.last(), Some(&new));
        assert!(insert_at(&mut order, Uuid::now_v7(), Some(5)).is_err());
    }
}
