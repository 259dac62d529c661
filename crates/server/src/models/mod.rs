//! Domain models and request/response value types.

pub mod customer;
pub mod order;
pub mod product;
pub mod user;

pub use customer::{Customer, CustomerInput, NewCustomer};
pub use order::{
    NewOrder, Order, OrderFilter, OrderInput, OrderItem, OrderItemDraft, OrderItemInput,
    OrderItemResponse, OrderListQuery, OrderResponse, OrderSortField, OrderWithItems,
    SortDirection, StatusUpdateInput,
};
pub use product::{Product, ProductFilter, ProductInput, ProductSummary};
pub use user::{LoginInput, RefreshInput, RefreshToken, RegisterInput, TokenPair, User, UserResponse};
