//! Solidity interfaces of the staking system contracts.

use alloy_sol_types::sol;

// ============================================
// REGISTRY (LIQUIDITY POOL MANAGER)
// ============================================

sol! {
    /// Whitelist registry of liquidity pairs and their reward weights
    #[derive(Debug)]
    interface ILiquidityPoolManager {
        function isPoolWhitelisted(address pair) external view returns (bool);
        function getPoolWeight(address pair) external view returns (uint256);
        function getPoolCount() external view returns (uint256);
        function stakingContracts(address pair) external view returns (address);

        /// Reverts for pairs that are not denominated in the native asset
        function getNativeLiquidityValue(address pair) external view returns (uint256);
    }
}

// ============================================
// PER-POOL STAKING CONTRACT
// ============================================

sol! {
    #[derive(Debug)]
    interface IStakingRewards {
        function totalSupply() external view returns (uint256);
        function rewardRate() external view returns (uint256);
        function periodFinish() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function earned(address account) external view returns (uint256);

        function stake(uint256 amount) external;
        function stakeWithPermit(uint256 amount, uint256 deadline, uint8 v, bytes32 r, bytes32 s) external;
        function withdraw(uint256 amount) external;
        function getReward() external;
        function exit() external;
    }
}

// ============================================
// REWARD VESTING
// ============================================

sol! {
    #[derive(Debug)]
    interface IRewardVesting {
        function vestingAmount() external view returns (uint256);
        function halvingPeriod() external view returns (uint256);
        function vestingEnabled() external view returns (bool);
    }
}

// ============================================
// LP TOKEN (ERC-20 + EIP-2612)
// ============================================

sol! {
    #[derive(Debug)]
    interface IERC20Permit {
        function name() external view returns (string);
        function nonces(address owner) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }

    /// EIP-2612 typed message
    #[derive(Debug, PartialEq, Eq)]
    struct Permit {
        address owner;
        address spender;
        uint256 value;
        uint256 nonce;
        uint256 deadline;
    }
}
