//! # Sentinel Core
//!
//! 인증/인가 코어의 공통 기반을 제공합니다:
//! - 구조화된 에러 코드 레지스트리와 내장 코드 목록
//! - 코드가 붙은 에러 인스턴스
//! - 주입 가능한 시계
//! - 마감/취소를 전달하는 작업 컨텍스트
//! - 설정 관리
//! - 로깅 인프라

pub mod clock;
pub mod config;
pub mod context;
pub mod errno;
pub mod error;
pub mod logging;

pub use clock::{system_clock, Clock, ManualClock, SharedClock, SystemClock};
pub use config::*;
pub use context::OpContext;
pub use errno::{Category, Errno, RpcCode};
pub use error::{is_code, Error, Result};
pub use logging::*;
