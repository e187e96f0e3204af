//! Data Transfer Objects (DTOs)
//!
//! Inputs and outputs of the order use cases.

mod order_dto;

pub use order_dto::{
    BulkOrderRequestDto, BulkOrderResponseDto, CustomerOrderDto, OrderDto, UpdateOrderRequestDto,
    ValidateLotRequestDto, ValidateLotResponseDto,
};
