//! # collab-service
//!
//! Application layer: the token authority, confirmation codes, login and the
//! chat use cases shared by the HTTP API and the realtime gateway.

pub mod dto;
pub mod services;

pub use services::{
    AuthService, ChatService, LoggingMailer, ServiceContext, ServiceContextBuilder, ServiceError,
    ServiceResult, TokenAuthority, TokenError, TokenPair, VerificationService,
};
