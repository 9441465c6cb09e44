use april_matrix::token::MAX_BUNCH_DEPTH;
use april_matrix::{DecodeError, Error, ErrorKind, Token, TokenCode, TokenMemoryBlock, TokenVector};

/// Byte form of `levels` bunches, each holding the next one.
fn nested_bunches(levels: usize) -> Vec<u8> {
    // an empty bunch is 9 bytes; each wrapper adds a code, a count and a length
    let size = |level: usize| 9 + 17 * (level - 1);
    let mut bytes = Vec::with_capacity(size(levels));
    for level in (2..=levels).rev() {
        bytes.push(TokenCode::Bunch as u8);
        bytes.extend_from_slice(&1u64.to_le_bytes());
        bytes.extend_from_slice(&(size(level - 1) as u64).to_le_bytes());
    }
    bytes.push(TokenCode::Bunch as u8);
    bytes.extend_from_slice(&0u64.to_le_bytes());
    bytes
}

fn sample_bunch() -> Token {
    let mut inner = TokenVector::new();
    inner.push(Token::VectorF32(TokenVector::from_vec(vec![1.5, -2.0])));
    inner.push(Token::VectorChar(TokenVector::from_vec(b"abc".to_vec())));
    inner.push(Token::Bunch(TokenVector::from_vec(vec![Token::VectorU32(
        TokenVector::from_vec(vec![7, 8, 9]),
    )])));
    Token::Bunch(inner)
}

#[test]
fn test_every_variant_survives_bytes() {
    let mut block = TokenMemoryBlock::new(3).unwrap();
    block.resize(3).unwrap();
    block.values_mut().copy_from_slice(&[0.25, 0.5, 0.75]);
    let tokens = vec![
        Token::MemoryBlock(block),
        Token::VectorF32(TokenVector::from_vec(vec![f32::MIN_POSITIVE, 3.0])),
        Token::VectorF64(TokenVector::from_vec(vec![1e-200, -0.0])),
        Token::VectorI32(TokenVector::from_vec(vec![i32::MIN, 0, i32::MAX])),
        Token::VectorU32(TokenVector::from_vec(vec![u32::MAX])),
        Token::VectorChar(TokenVector::from_vec(b"hello".to_vec())),
        sample_bunch(),
    ];
    for token in tokens {
        let bytes = token.to_bytes();
        assert_eq!(bytes[0], token.code() as u8);
        let back = Token::from_bytes(&bytes).unwrap();
        assert_eq!(back.code(), token.code());
        assert_eq!(back.to_bytes(), bytes);
    }
}

#[test]
fn test_clone_is_independent() {
    let original = Token::VectorI32(TokenVector::from_vec(vec![1, 2, 3]));
    let mut copy = original.clone();
    if let Token::VectorI32(v) = &mut copy {
        v[0] = 100;
    }
    assert_eq!(original.to_text().as_deref(), Some("1 2 3"));
    assert_eq!(copy.to_text().as_deref(), Some("100 2 3"));
}

#[test]
fn test_memory_block_clone_copies_values() {
    let mut block = TokenMemoryBlock::new(2).unwrap();
    block.resize(2).unwrap();
    block.values_mut()[0] = 4.0;
    let mut copy = block.clone();
    copy.values_mut()[0] = -1.0;
    assert_eq!(block.values(), &[4.0, 0.0]);
    assert_eq!(copy.values(), &[-1.0, 0.0]);
}

#[test]
fn test_text_forms() {
    let t = Token::VectorF64(TokenVector::from_vec(vec![0.5, -3.0]));
    let text = t.to_text().unwrap();
    assert_eq!(text, "0.5 -3");
    let back = Token::from_text(TokenCode::VectorF64, &text).unwrap().unwrap();
    assert_eq!(back.to_bytes(), t.to_bytes());

    let block = Token::MemoryBlock(TokenMemoryBlock::new(1).unwrap());
    assert!(block.to_text().is_none());
    assert!(sample_bunch().to_text().is_none());
    assert!(Token::from_text(TokenCode::MemoryBlock, "").unwrap().is_none());

    let err = Token::from_text(TokenCode::VectorI32, "1 two").unwrap_err();
    assert!(matches!(err, Error::Decode(DecodeError::MalformedToken { index: 1, .. })));
}

#[test]
fn test_decode_failures() {
    assert!(matches!(
        Token::from_bytes(&[]),
        Err(Error::Decode(DecodeError::Truncated { .. }))
    ));
    assert!(matches!(
        Token::from_bytes(&[0]),
        Err(Error::Decode(DecodeError::UnknownTokenCode(0)))
    ));

    let mut bytes = Token::VectorU32(TokenVector::from_vec(vec![1, 2])).to_bytes();
    bytes.push(0);
    assert!(matches!(
        Token::from_bytes(&bytes),
        Err(Error::Decode(DecodeError::TrailingData(1)))
    ));
    bytes.truncate(bytes.len() - 3);
    assert!(matches!(
        Token::from_bytes(&bytes),
        Err(Error::Decode(DecodeError::Truncated { expected: 2, found: 1 }))
    ));
}

#[test]
fn test_new_memory_block_has_nothing_in_use() {
    let mut block = TokenMemoryBlock::new(8).unwrap();
    assert!(block.is_empty());
    assert_eq!(block.capacity(), 8);
    assert!(block.values().is_empty());
    block.resize(5).unwrap();
    assert_eq!(block.values(), &[0.0; 5]);
    assert_eq!(block.capacity(), 8);
}

#[test]
fn test_bunch_nesting_limit() {
    let token = Token::from_bytes(&nested_bunches(MAX_BUNCH_DEPTH)).unwrap();
    assert_eq!(token.code(), TokenCode::Bunch);

    let err = Token::from_bytes(&nested_bunches(MAX_BUNCH_DEPTH + 1)).unwrap_err();
    assert!(matches!(err, Error::Decode(DecodeError::NestingTooDeep(MAX_BUNCH_DEPTH))));

    // far deeper than any stack could recurse through
    let err = Token::from_bytes(&nested_bunches(100_000)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
}
