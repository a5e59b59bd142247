use super::*;

#[test]
fn test_describe_splits_fields() {
    let id = (5_i64 << 20) | (3 << 7) | 9;
    assert_eq!(describe(id), "+5s seq 3 instance 9");
}

#[test]
fn test_encode_decode_known_value() {
    assert_eq!(encode(3414442), "JVzh");
    assert_eq!(decode("JVzh").unwrap(), 3414442);
}
