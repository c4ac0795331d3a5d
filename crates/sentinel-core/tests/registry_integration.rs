//! 전역 에러 레지스트리 통합 테스트
//!
//! 서비스별 코드를 등록하고 조회, 분류, 변환하는 흐름을 확인합니다.

use sentinel_core::errno::{
    self, from_legacy, is_client_error, is_server_error, lookup, make_code, new_auth_error,
    new_config_error, parse_code, register_service, to_legacy, ErrnoBuilder, ERR_INTERNAL,
    ERR_INVALID_TOKEN,
};
use sentinel_core::{is_code, Category, Error, RpcCode};

const BILLING: i32 = 31;

#[test]
fn test_service_lifecycle() {
    register_service(BILLING, "billing").unwrap();
    assert_eq!(errno::service_name(BILLING).as_deref(), Some("billing"));

    let card_expired = new_auth_error(BILLING, 1, "Card session expired", Some("卡会话已过期")).unwrap();
    let bad_config = new_config_error(BILLING, 1, "Missing merchant id", None).unwrap();

    assert_eq!(card_expired.code(), make_code(BILLING, 2, 1).unwrap());
    assert_eq!(parse_code(card_expired.code()).unwrap(), (BILLING, 2, 1));
    assert_eq!(card_expired.category(), Some(Category::Auth));
    assert!(is_client_error(card_expired.code()));
    assert!(is_server_error(bad_config.code()));

    let found = lookup(card_expired.code()).unwrap();
    assert!(std::ptr::eq(found, card_expired));
    assert_eq!(found.message("zh-CN"), "卡会话已过期");
}

#[test]
fn test_builder_and_factory_share_registration_path() {
    let via_builder = ErrnoBuilder::new(32, 6, 4)
        .message("Too many invoices", None)
        .build()
        .unwrap();
    let via_factory =
        errno::new_rate_limit_error(32, 4, "Too many invoices", None).unwrap();
    assert!(std::ptr::eq(via_builder, via_factory));
    assert_eq!(via_builder.http_status(), 429);
    assert_eq!(via_builder.rpc_status(), RpcCode::ResourceExhausted);
}

#[test]
fn test_error_propagation_through_boxed_errors() {
    fn verify() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(ERR_INVALID_TOKEN.with_message("token is malformed")))
    }

    let boxed = verify().unwrap_err();
    assert!(is_code(boxed.as_ref(), &ERR_INVALID_TOKEN));

    let err = Error::from_any(boxed);
    assert!(err.is(&ERR_INVALID_TOKEN));
    assert!(!err.is(&ERR_INTERNAL));
}

#[test]
fn test_legacy_translation_is_lossless_for_known_codes() {
    let packed = from_legacy(40102);
    assert_eq!(packed, ERR_INVALID_TOKEN.code());
    assert_eq!(to_legacy(packed), 40102);
    assert_eq!(from_legacy(77), 77);
}
