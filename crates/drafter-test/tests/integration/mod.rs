mod bootstrap;
mod delivery;
mod helpers;
mod lifecycle;
mod routing;
