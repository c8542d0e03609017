use serde::{Deserialize, Serialize};

use super::{AMOUNT_EPSILON, Amount, Balances, Participant, ParticipantId};

/// One payment needed to settle the group: `from` pays `to`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementTransfer {
    pub from: ParticipantId,
    pub to: ParticipantId,
    pub amount: Amount,
}

/// Turn net balances into a list of payments that brings everyone to zero.
///
/// Debtors are matched against creditors greedily, both walked in roster order,
/// so the result is deterministic for a given roster. Balances within
/// [`AMOUNT_EPSILON`] of zero are treated as settled.
pub fn plan_settlement(balances: &Balances, participants: &[Participant]) -> Vec<SettlementTransfer> {
    let balance_of = |p: &Participant| balances.get(&p.id).copied().unwrap_or(0.0);

    let mut creditors: Vec<(&ParticipantId, Amount)> = participants
        .iter()
        .map(|p| (&p.id, balance_of(p)))
        .filter(|(_, b)| *b > AMOUNT_EPSILON)
        .collect();
    let mut debtors: Vec<(&ParticipantId, Amount)> = participants
        .iter()
        .map(|p| (&p.id, -balance_of(p)))
        .filter(|(_, owed)| *owed > AMOUNT_EPSILON)
        .collect();

    let mut transfers = Vec::new();
    let (mut c, mut d) = (0, 0);

    while c < creditors.len() && d < debtors.len() {
        let amount = creditors[c].1.min(debtors[d].1);
        transfers.push(SettlementTransfer {
            from: debtors[d].0.clone(),
            to: creditors[c].0.clone(),
            amount,
        });

        creditors[c].1 -= amount;
        debtors[d].1 -= amount;
        if creditors[c].1 <= AMOUNT_EPSILON {
            c += 1;
        }
        if debtors[d].1 <= AMOUNT_EPSILON {
            d += 1;
        }
    }

    transfers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<Participant> {
        vec![
            Participant::new("a", "A"),
            Participant::new("b", "B"),
            Participant::new("c", "C"),
            Participant::new("d", "D"),
        ]
    }

    fn balances(entries: &[(&str, Amount)]) -> Balances {
        entries.iter().map(|(id, b)| (id.to_string(), *b)).collect()
    }

    fn apply(balances: &Balances, transfers: &[SettlementTransfer]) -> Balances {
        let mut result = balances.clone();
        for t in transfers {
            *result.get_mut(&t.from).unwrap() += t.amount;
            *result.get_mut(&t.to).unwrap() -= t.amount;
        }
        result
    }

    #[test]
    fn test_settled_group_needs_no_transfers() {
        let b = balances(&[("a", 0.0), ("b", 1e-9), ("c", -1e-9), ("d", 0.0)]);
        assert!(plan_settlement(&b, &roster()).is_empty());
    }

    #[test]
    fn test_single_creditor() {
        let b = balances(&[("a", 160.0), ("b", -80.0), ("c", -80.0), ("d", 0.0)]);
        let transfers = plan_settlement(&b, &roster());

        assert_eq!(
            transfers,
            vec![
                SettlementTransfer {
                    from: "b".into(),
                    to: "a".into(),
                    amount: 80.0
                },
                SettlementTransfer {
                    from: "c".into(),
                    to: "a".into(),
                    amount: 80.0
                },
            ]
        );
    }

    #[test]
    fn test_transfers_zero_out_all_balances() {
        let b = balances(&[("a", 100.0), ("b", -30.5), ("c", 20.25), ("d", -89.75)]);
        let transfers = plan_settlement(&b, &roster());

        assert!(transfers.len() <= 3);
        assert!(transfers.iter().all(|t| t.amount > 0.0));
        let after = apply(&b, &transfers);
        assert!(after.values().all(|v| v.abs() < 1e-6));
    }

    #[test]
    fn test_missing_balance_is_treated_as_zero() {
        let b = balances(&[("a", 10.0), ("b", -10.0)]);
        let transfers = plan_settlement(&b, &roster());
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].from, "b");
    }
}
