//! Splitting of outbound I2C payloads into report-sized chunks.

use crate::i2c::I2cCondition;
use crate::registers::I2C_MAX_PAYLOAD;

/// One outbound I2C report: up to 60 payload bytes and their condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionChunk<'a> {
    pub payload: &'a [u8],
    pub condition: I2cCondition,
}

/// Split `data` into chunks of at most [`I2C_MAX_PAYLOAD`] bytes.
///
/// The first chunk carries START, the last one STOP if `stop` is set, every
/// chunk in between carries no condition. A single chunk carries
/// START + STOP, or START alone without `stop`. Empty data yields no chunks.
pub fn split_transaction(stop: bool, data: &[u8]) -> Vec<TransactionChunk<'_>> {
    let count = data.len().div_ceil(I2C_MAX_PAYLOAD);
    data.chunks(I2C_MAX_PAYLOAD)
        .enumerate()
        .map(|(index, payload)| {
            let condition = if count == 1 {
                if stop {
                    I2cCondition::StartStop
                } else {
                    I2cCondition::Start
                }
            } else if index == 0 {
                I2cCondition::Start
            } else if index == count - 1 && stop {
                I2cCondition::Stop
            } else {
                I2cCondition::None
            };
            TransactionChunk { payload, condition }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use I2cCondition::{None as Nothing, Start, StartStop, Stop};

    fn check(stop: bool, data: &[u8], payloads: &[&[u8]], conditions: &[I2cCondition]) {
        let chunks = split_transaction(stop, data);
        let got_payloads: Vec<&[u8]> = chunks.iter().map(|c| c.payload).collect();
        let got_conditions: Vec<I2cCondition> = chunks.iter().map(|c| c.condition).collect();
        assert_eq!(got_payloads, payloads, "payloads for {} bytes, stop={}", data.len(), stop);
        assert_eq!(got_conditions, conditions, "conditions for {} bytes, stop={}", data.len(), stop);
    }

    fn sample() -> Vec<u8> {
        (0..130u8).map(|i| i + 10).collect()
    }

    #[test]
    fn empty_payload_sends_nothing() {
        check(true, &[], &[], &[]);
        check(false, &[], &[], &[]);
    }

    #[test]
    fn single_byte() {
        check(true, &[44], &[&[44]], &[StartStop]);
        check(false, &[44], &[&[44]], &[Start]);
    }

    #[test]
    fn up_to_one_full_report() {
        let data = sample();
        for len in [59, 60] {
            check(true, &data[..len], &[&data[..len]], &[StartStop]);
            check(false, &data[..len], &[&data[..len]], &[Start]);
        }
    }

    #[test]
    fn two_reports() {
        let data = sample();
        for len in [61, 119, 120] {
            check(true, &data[..len], &[&data[..60], &data[60..len]], &[Start, Stop]);
            check(false, &data[..len], &[&data[..60], &data[60..len]], &[Start, Nothing]);
        }
    }

    #[test]
    fn three_reports() {
        let data = sample();
        for len in [121, 130] {
            let payloads: [&[u8]; 3] = [&data[..60], &data[60..120], &data[120..len]];
            check(true, &data[..len], &payloads, &[Start, Nothing, Stop]);
            check(false, &data[..len], &payloads, &[Start, Nothing, Nothing]);
        }
    }

    #[test]
    fn chunk_lengths_sum_to_payload_length() {
        let data = vec![0u8; 400];
        for len in 0..=data.len() {
            for stop in [false, true] {
                let chunks = split_transaction(stop, &data[..len]);
                assert_eq!(chunks.iter().map(|c| c.payload.len()).sum::<usize>(), len);
                assert!(chunks.iter().all(|c| !c.payload.is_empty() && c.payload.len() <= I2C_MAX_PAYLOAD));
                if let Some((last, rest)) = chunks.split_last() {
                    assert!(rest.iter().all(|c| c.payload.len() == I2C_MAX_PAYLOAD));
                    if !rest.is_empty() {
                        assert_eq!(rest[0].condition, Start);
                        assert!(rest[1..].iter().all(|c| c.condition == Nothing));
                        assert_eq!(last.condition, if stop { Stop } else { Nothing });
                    }
                }
            }
        }
    }
}
