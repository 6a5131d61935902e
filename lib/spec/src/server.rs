//  SERVER.rs
//
//  Created:
//    23 Oct 2024, 11:37:44
//  Last edited:
//    17 Oct 2026, 13:05:51
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements some abstraction over something waiting for requests and
//!   running them through the admission path.
//

use std::error::Error;
use std::future::Future;

use never_say_never::Never;


/***** LIBRARY *****/
/// Abstracts over the "frontend" of the backend; i.e., some API or other interface that listens for
/// requests, admits them and talks to the stores as necessary.
pub trait Server {
    /// The type of errors emitted by this server.
    type Error: Error;


    /// Runs this server forever.
    ///
    /// # Returns
    /// [`Never`].
    ///
    /// # Errors
    /// This function may error if the server failed to bind or if it stopped serving for whatever
    /// reason. Client-side errors never surface at this level.
    fn serve(self) -> impl Future<Output = Result<Never, Self::Error>>;

    /// Runs this server until the given future completes, after which in-flight requests are
    /// allowed to finish.
    ///
    /// # Arguments
    /// - `shutdown`: Some [`Future`] that completes when the server should stop (e.g., on SIGTERM).
    ///
    /// # Errors
    /// This function may error if the server failed to bind or if it crashed while serving.
    fn serve_until<F>(self, shutdown: F) -> impl Future<Output = Result<(), Self::Error>>
    where
        F: 'static + Send + Future<Output = ()>;
}
