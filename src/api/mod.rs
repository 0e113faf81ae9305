/// Build an in-process app around a `Arc<dyn Store>` for handler tests.
#[cfg(test)]
macro_rules! test_app {
    ($store:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(actix_web::middleware::NormalizePath::trim())
                .app_data(actix_web::web::Data::from($store))
                .configure(|cfg| {
                    crate::routes::configure(
                        cfg,
                        &crate::config::Config {
                            rate_api_per_min: 0,
                            ..Default::default()
                        },
                    )
                }),
        )
        .await
    };
}

#[cfg(test)]
pub(crate) use test_app;

pub mod attendance;
pub mod employee;
pub mod report;
