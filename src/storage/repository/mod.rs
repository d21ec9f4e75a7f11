pub mod appuntamento_repo;
pub mod auth_repo;
pub mod bolla_repo;
pub mod cliente_repo;
pub mod pozzo_repo;

pub use appuntamento_repo::{
    AppuntamentoDto, AppuntamentoFilter, AppuntamentoRepository, CreateAppuntamento,
    StatoAppuntamento, UpdateAppuntamento,
};
pub use auth_repo::{AccessAttempt, AuthLogDto, AuthRepository, AuthUserDto, PasswordInfo};
pub use bolla_repo::{BollaDto, BollaRepository, CreateBolla, UpdateBolla};
pub use cliente_repo::{ClienteDto, ClienteRepository, CreateCliente, UpdateCliente};
pub use pozzo_repo::{CreatePozzo, PozzoDto, PozzoRepository, UpdatePozzo};
