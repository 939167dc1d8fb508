use alloy::sol;

sol! {
    interface IUniswapV2Factory {
        event PairCreated(address indexed token0, address indexed token1, address pair, uint256 pairCount);
    }

    interface IUniswapV2Pair {
        event Mint(address indexed sender, uint256 amount0, uint256 amount1);
        event Transfer(address indexed from, address indexed to, uint256 value);
    }
}
