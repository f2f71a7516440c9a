//! 侧边栏与首页静态内容
//!
//! 纯函数：根据认证状态与角色给出菜单项，无状态、无 I/O。

use crate::route::AppRoute;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Logout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuTarget {
    Route(AppRoute),
    Action(MenuAction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: &'static str,
    pub target: MenuTarget,
}

const fn route(label: &'static str, route: AppRoute) -> MenuEntry {
    MenuEntry {
        label,
        target: MenuTarget::Route(route),
    }
}

const LOGOUT: MenuEntry = MenuEntry {
    label: "Cerrar sesión",
    target: MenuTarget::Action(MenuAction::Logout),
};

/// 侧边栏菜单
pub fn sidebar_options(authenticated: bool, is_admin: bool) -> Vec<MenuEntry> {
    if !authenticated {
        return vec![
            route("Inicia sesión", AppRoute::Login),
            route("Regístrate", AppRoute::Signup),
            route("Acerca de", AppRoute::About),
        ];
    }

    if is_admin {
        return vec![
            route("Administrar nodos", AppRoute::NodeCreate),
            route("Acerca de", AppRoute::About),
            LOGOUT,
        ];
    }

    vec![route("Acerca de", AppRoute::About), LOGOUT]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HomeCard {
    pub text: &'static str,
    pub icon: &'static str,
}

pub fn home_cards() -> [HomeCard; 3] {
    [
        HomeCard {
            text: "Encuentra aulas, baños o servicios en segundos",
            icon: "icons/binoculars",
        },
        HomeCard {
            text: "Explora el campus como si estuvieras allí",
            icon: "icons/aperture",
        },
        HomeCard {
            text: "Llega rápido con señalamiento paso a paso",
            icon: "icons/route",
        },
    ]
}

pub fn general_info() -> &'static str {
    "Navega el campus con mapas 360°, rutas personalizadas y búsqueda inteligente. \
     Olvídate de perderte y disfruta de una experiencia universitaria fluida."
}
